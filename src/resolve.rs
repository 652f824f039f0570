//! 类型推断：Shape → CQL 列类型描述串
//!
//! 标量直接查表；集合递归一层；结构体（以及集合里的结构体）
//! 查 [`TypeRegistry`] 得到 UDT 名，渲染成 `frozen<Name>`。
//! 集合套集合不支持，直接报错。

use std::collections::HashMap;
use crate::common::{Result, SchemaError};
use crate::field_type::{ColumnShape, ColumnType, Shape};

// ── UDT 注册表 ────────────────────────────────────────────────────────────────

/// 形状标识 → UDT 名
///
/// 只由显式注册写入，从不自动删除；同一形状后注册者覆盖先注册者。
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: HashMap<String, String>,
}

impl TypeRegistry {
    pub fn new() -> Self { Self::default() }

    /// 返回被覆盖的旧名字（如有）
    pub fn register(&mut self, shape_id: &str, udt_name: &str) -> Option<String> {
        self.types.insert(shape_id.into(), udt_name.into())
    }

    pub fn lookup(&self, shape_id: &str) -> Option<&str> {
        self.types.get(shape_id).map(String::as_str)
    }

    pub fn len(&self) -> usize { self.types.len() }
    pub fn is_empty(&self) -> bool { self.types.is_empty() }
}

// ── 推断 ──────────────────────────────────────────────────────────────────────

/// 推断一个字段的列类型
pub fn resolve(shape: &Shape, registry: &TypeRegistry) -> Result<String> {
    match shape {
        s if s.is_bytes() => Ok(ColumnType::Blob.to_string()),

        Shape::List(elem) => match ColumnType::from(elem.as_ref()) {
            ColumnType::Custom => {
                let udt = udt_of(elem, registry)?;
                Ok(format!("list<frozen<{udt}>>"))
            }
            ct => Ok(format!("list<{ct}>")),
        },

        Shape::Map(key, value) => {
            let key_ct = match ColumnType::from(key.as_ref()) {
                ColumnType::Custom =>
                    return Err(SchemaError::UnsupportedMapKeyType(key.to_string())),
                ct => ct,
            };
            match ColumnType::from(value.as_ref()) {
                ColumnType::Custom => {
                    let udt = udt_of(value, registry)?;
                    Ok(format!("map<{key_ct}, frozen<{udt}>>"))
                }
                ct => Ok(format!("map<{key_ct}, {ct}>")),
            }
        }

        s => match ColumnType::from(s) {
            ColumnType::Custom => Ok(format!("frozen<{}>", udt_of(s, registry)?)),
            ct                 => Ok(ct.to_string()),
        },
    }
}

/// 按样本值推断：结果只取决于值的类型，与值本身无关
pub fn resolve_value<T: ColumnShape>(_sample: &T, registry: &TypeRegistry) -> Result<String> {
    resolve(&T::shape(), registry)
}

/// 查注册表；只有结构体形状可能命中，集合套集合一律不支持
fn udt_of<'r>(shape: &Shape, registry: &'r TypeRegistry) -> Result<&'r str> {
    match shape {
        Shape::Record(rec) => registry
            .lookup(&rec.name)
            .ok_or_else(|| SchemaError::UnsupportedType(shape.to_string())),
        _ => Err(SchemaError::UnsupportedType(shape.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, HashMap};
    use chrono::{DateTime, Utc};
    use proptest::prelude::*;
    use crate::field_type::Counter;

    #[derive(Debug)]
    struct Address { street: String, zip: i32 }
    crate::record_shape!(Address { street: String, zip: i32 });

    fn registry_with_address() -> TypeRegistry {
        let mut reg = TypeRegistry::new();
        let shape = Address::shape();
        reg.register(&shape.to_string(), "address");
        reg
    }

    fn r<T: ColumnShape>(reg: &TypeRegistry) -> Result<String> {
        resolve(&T::shape(), reg)
    }

    #[test]
    fn scalars() {
        let reg = TypeRegistry::new();
        assert_eq!(r::<i32>(&reg).unwrap(), "int");
        assert_eq!(r::<i64>(&reg).unwrap(), "bigint");
        assert_eq!(r::<u64>(&reg).unwrap(), "varint");
        assert_eq!(r::<String>(&reg).unwrap(), "varchar");
        assert_eq!(r::<f32>(&reg).unwrap(), "float");
        assert_eq!(r::<f64>(&reg).unwrap(), "double");
        assert_eq!(r::<bool>(&reg).unwrap(), "boolean");
        assert_eq!(r::<DateTime<Utc>>(&reg).unwrap(), "timestamp");
        assert_eq!(r::<uuid::Uuid>(&reg).unwrap(), "uuid");
        assert_eq!(r::<Vec<u8>>(&reg).unwrap(), "blob");
        assert_eq!(r::<Counter>(&reg).unwrap(), "counter");
    }

    #[test]
    fn collections_of_scalars() {
        let reg = TypeRegistry::new();
        assert_eq!(r::<Vec<String>>(&reg).unwrap(), "list<varchar>");
        assert_eq!(r::<HashMap<String, i64>>(&reg).unwrap(), "map<varchar, bigint>");
        assert_eq!(r::<BTreeMap<i32, bool>>(&reg).unwrap(), "map<int, boolean>");
    }

    #[test]
    fn registered_udt_everywhere() {
        let reg = registry_with_address();
        assert_eq!(r::<Address>(&reg).unwrap(), "frozen<address>");
        assert_eq!(r::<Vec<Address>>(&reg).unwrap(), "list<frozen<address>>");
        assert_eq!(
            r::<HashMap<String, Address>>(&reg).unwrap(),
            "map<varchar, frozen<address>>",
        );
    }

    #[test]
    fn unregistered_udt_names_the_element_shape() {
        let reg = TypeRegistry::new();
        let expected = Address::shape().to_string();
        match r::<HashMap<String, Address>>(&reg) {
            Err(SchemaError::UnsupportedType(s)) => assert_eq!(s, expected),
            other => panic!("unexpected: {other:?}"),
        }
        match r::<Vec<Address>>(&reg) {
            Err(SchemaError::UnsupportedType(s)) => assert_eq!(s, expected),
            other => panic!("unexpected: {other:?}"),
        }
        assert!(matches!(r::<Address>(&reg), Err(SchemaError::UnsupportedType(_))));
    }

    #[test]
    fn custom_map_key_rejected_even_if_registered() {
        let reg = registry_with_address();
        let shape = Shape::map(Address::shape(), Shape::Str);
        assert!(matches!(resolve(&shape, &reg), Err(SchemaError::UnsupportedMapKeyType(_))));
    }

    #[test]
    fn nested_collections_fail_fast() {
        let reg = TypeRegistry::new();
        assert!(matches!(r::<Vec<Vec<i32>>>(&reg), Err(SchemaError::UnsupportedType(_))));
        assert!(matches!(
            r::<HashMap<String, Vec<String>>>(&reg),
            Err(SchemaError::UnsupportedType(_)),
        ));
    }

    #[test]
    fn byte_arrays_are_scalar_elements() {
        // 字节序列本身是 blob 标量，不算集合套集合
        let reg = TypeRegistry::new();
        assert_eq!(r::<Vec<Vec<u8>>>(&reg).unwrap(), "list<blob>");
        assert_eq!(r::<HashMap<String, Vec<u8>>>(&reg).unwrap(), "map<varchar, blob>");
    }

    #[test]
    fn last_registration_wins() {
        let mut reg = registry_with_address();
        let old = reg.register(&Address::shape().to_string(), "addr_v2");
        assert_eq!(old.as_deref(), Some("address"));
        assert_eq!(reg.len(), 1);
        assert_eq!(r::<Address>(&reg).unwrap(), "frozen<addr_v2>");
    }

    proptest! {
        #[test]
        fn scalar_type_is_value_independent(
            a in any::<i64>(),
            b in any::<bool>(),
            s in ".*",
            xs in proptest::collection::vec(any::<i32>(), 0..8),
        ) {
            let reg = TypeRegistry::new();
            prop_assert_eq!(resolve_value(&a, &reg).unwrap(), "bigint");
            prop_assert_eq!(resolve_value(&b, &reg).unwrap(), "boolean");
            prop_assert_eq!(resolve_value(&s, &reg).unwrap(), "varchar");
            prop_assert_eq!(resolve_value(&xs, &reg).unwrap(), "list<int>");
        }
    }
}
