/// Mock 模块 - 基于 schema 的请求体构建与字段覆盖
pub mod builder;
pub mod overrides;
pub mod path;

pub use builder::{MockBuilder, UNRESOLVED_OBJECT_MOCK, body_reference, wants_mock};
pub use overrides::{FieldOverride, collect_overrides, select_one_of};
