/// Schema 模块 - 请求 schema 解析与默认值生成
pub mod field;
pub mod generator;
pub mod types;

pub use field::FieldKind;
pub use generator::SchemaGenerator;
pub use types::{ArraySchema, LeafSchema, LeafType, ObjectSchema, Schema};
