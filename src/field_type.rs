//! 宿主值形状与 CQL 标量列类型
//!
//! 没有运行时反射：每个可入列的 Rust 类型通过 [`ColumnShape`] 报告自己的
//! 形状（[`Shape`]），类型推断只在这个封闭的枚举上做 match。

use std::collections::{BTreeMap, HashMap};

// ── 形状 ──────────────────────────────────────────────────────────────────────

/// 宿主值的类别标签
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    I8, I16, I32, I64, Isize,
    U8, U16, U32, U64, Usize,
    Str,
    F32, F64,
    Bool,
    Timestamp,
    Uuid,
    Counter,
    /// 序列；`List(U8)` 即原始字节
    List(Box<Shape>),
    /// 键值映射
    Map(Box<Shape>, Box<Shape>),
    /// 具名复合结构（行或 UDT）
    Record(RecordShape),
}

impl Shape {
    pub fn list(elem: Shape) -> Self { Self::List(Box::new(elem)) }
    pub fn map(key: Shape, value: Shape) -> Self { Self::Map(Box::new(key), Box::new(value)) }

    pub fn is_bytes(&self) -> bool {
        matches!(self, Self::List(elem) if **elem == Self::U8)
    }

    /// 将形状拆解为具名字段；非结构体返回 None
    pub fn as_record(&self) -> Option<&RecordShape> {
        match self { Self::Record(r) => Some(r), _ => None }
    }
}

/// 形状标识：与 TypeRegistry 的键以及错误信息使用同一套文本
impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::I8        => write!(f, "i8"),
            Self::I16       => write!(f, "i16"),
            Self::I32       => write!(f, "i32"),
            Self::I64       => write!(f, "i64"),
            Self::Isize     => write!(f, "isize"),
            Self::U8        => write!(f, "u8"),
            Self::U16       => write!(f, "u16"),
            Self::U32       => write!(f, "u32"),
            Self::U64       => write!(f, "u64"),
            Self::Usize     => write!(f, "usize"),
            Self::Str       => write!(f, "String"),
            Self::F32       => write!(f, "f32"),
            Self::F64       => write!(f, "f64"),
            Self::Bool      => write!(f, "bool"),
            Self::Timestamp => write!(f, "DateTime<Utc>"),
            Self::Uuid      => write!(f, "Uuid"),
            Self::Counter   => write!(f, "Counter"),
            Self::List(e)   => write!(f, "Vec<{e}>"),
            Self::Map(k, v) => write!(f, "HashMap<{k}, {v}>"),
            Self::Record(r) => write!(f, "{}", r.name),
        }
    }
}

/// 一个字段：名字 + 用于类型推断的形状
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name:  String,
    pub shape: Shape,
}

impl Field {
    pub fn new(name: &str, shape: Shape) -> Self {
        Self { name: name.into(), shape }
    }
}

/// 结构体形状；`name` 为完整类型路径，是 UDT 注册表的键
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordShape {
    pub name:   String,
    pub fields: Vec<Field>,
}

impl RecordShape {
    pub fn new(name: &str, fields: Vec<Field>) -> Self {
        Self { name: name.into(), fields }
    }
}

// ── ColumnShape ───────────────────────────────────────────────────────────────

/// 可以作为列（或行）出现的类型
pub trait ColumnShape {
    fn shape() -> Shape;
}

/// `counter` 列的标记类型
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Counter(pub i64);

macro_rules! scalar_shapes {
    ($($ty:ty => $shape:ident),* $(,)?) => {
        $(
            impl ColumnShape for $ty {
                fn shape() -> Shape { Shape::$shape }
            }
        )*
    };
}

scalar_shapes! {
    i8 => I8, i16 => I16, i32 => I32, i64 => I64, isize => Isize,
    u8 => U8, u16 => U16, u32 => U32, u64 => U64, usize => Usize,
    String => Str, &str => Str,
    f32 => F32, f64 => F64,
    bool => Bool,
    chrono::DateTime<chrono::Utc> => Timestamp,
    chrono::NaiveDateTime => Timestamp,
    std::time::SystemTime => Timestamp,
    uuid::Uuid => Uuid,
    Counter => Counter,
}

impl<T: ColumnShape> ColumnShape for Vec<T> {
    fn shape() -> Shape { Shape::list(T::shape()) }
}

impl<K: ColumnShape, V: ColumnShape, S> ColumnShape for HashMap<K, V, S> {
    fn shape() -> Shape { Shape::map(K::shape(), V::shape()) }
}

impl<K: ColumnShape, V: ColumnShape> ColumnShape for BTreeMap<K, V> {
    fn shape() -> Shape { Shape::map(K::shape(), V::shape()) }
}

/// 可空列：形状与 `T` 相同
impl<T: ColumnShape> ColumnShape for Option<T> {
    fn shape() -> Shape { T::shape() }
}

/// 为结构体实现 [`ColumnShape`]，字段按声明顺序列出
///
/// ```
/// use cql_schema::record_shape;
///
/// struct Address { street: String, zip: i32 }
/// record_shape!(Address { street: String, zip: i32 });
/// ```
#[macro_export]
macro_rules! record_shape {
    ($ty:ty { $($field:ident : $fty:ty),* $(,)? }) => {
        impl $crate::field_type::ColumnShape for $ty {
            fn shape() -> $crate::field_type::Shape {
                $crate::field_type::Shape::Record($crate::field_type::RecordShape::new(
                    ::std::any::type_name::<$ty>(),
                    vec![
                        $( $crate::field_type::Field::new(
                            stringify!($field),
                            <$fty as $crate::field_type::ColumnShape>::shape(),
                        ), )*
                    ],
                ))
            }
        }
    };
}

// ── CQL 标量类型 ──────────────────────────────────────────────────────────────

/// 标量列类型；集合与 UDT 由 resolve 层组合
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Int, BigInt, Varint,
    Varchar,
    Float, Double,
    Boolean,
    Timestamp,
    Uuid,
    Blob,
    Counter,
    /// 非标量：集合或结构体
    Custom,
}

impl From<&Shape> for ColumnType {
    fn from(shape: &Shape) -> Self {
        match shape {
            Shape::I32                   => Self::Int,
            Shape::I64 | Shape::Isize    => Self::BigInt,
            Shape::I8 | Shape::I16
            | Shape::U8 | Shape::U16
            | Shape::U32 | Shape::U64
            | Shape::Usize               => Self::Varint,
            Shape::Str                   => Self::Varchar,
            Shape::F32                   => Self::Float,
            Shape::F64                   => Self::Double,
            Shape::Bool                  => Self::Boolean,
            Shape::Timestamp             => Self::Timestamp,
            Shape::Uuid                  => Self::Uuid,
            Shape::Counter               => Self::Counter,
            s if s.is_bytes()            => Self::Blob,
            Shape::List(_) | Shape::Map(..) | Shape::Record(_) => Self::Custom,
        }
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Int       => "int",
            Self::BigInt    => "bigint",
            Self::Varint    => "varint",
            Self::Varchar   => "varchar",
            Self::Float     => "float",
            Self::Double    => "double",
            Self::Boolean   => "boolean",
            Self::Timestamp => "timestamp",
            Self::Uuid      => "uuid",
            Self::Blob      => "blob",
            Self::Counter   => "counter",
            Self::Custom    => "custom",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Point { x: i32, y: i32 }
    crate::record_shape!(Point { x: i32, y: i32 });

    #[test]
    fn scalar_table() {
        assert_eq!(ColumnType::from(&i32::shape()), ColumnType::Int);
        assert_eq!(ColumnType::from(&i64::shape()), ColumnType::BigInt);
        assert_eq!(ColumnType::from(&u16::shape()), ColumnType::Varint);
        assert_eq!(ColumnType::from(&i8::shape()), ColumnType::Varint);
        assert_eq!(ColumnType::from(&String::shape()), ColumnType::Varchar);
        assert_eq!(ColumnType::from(&f32::shape()), ColumnType::Float);
        assert_eq!(ColumnType::from(&uuid::Uuid::shape()), ColumnType::Uuid);
        assert_eq!(ColumnType::from(&Counter::shape()), ColumnType::Counter);
    }

    #[test]
    fn bytes_are_blob_not_list() {
        assert!(Vec::<u8>::shape().is_bytes());
        assert_eq!(ColumnType::from(&Vec::<u8>::shape()), ColumnType::Blob);
        assert_eq!(ColumnType::from(&Vec::<u16>::shape()), ColumnType::Custom);
    }

    #[test]
    fn option_is_transparent() {
        assert_eq!(Option::<i64>::shape(), Shape::I64);
    }

    #[test]
    fn record_macro_keeps_declaration_order() {
        let shape = Point::shape();
        let rec = shape.as_record().unwrap();
        assert!(rec.name.ends_with("Point"));
        let names: Vec<_> = rec.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["x", "y"]);
        assert_eq!(shape.to_string(), rec.name);
    }

    #[test]
    fn shape_identifiers() {
        assert_eq!(HashMap::<String, Vec<i32>>::shape().to_string(), "HashMap<String, Vec<i32>>");
    }
}
