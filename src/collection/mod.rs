/// 集合模块 - Postman 集合加载、遍历与工作步骤元数据解析
pub mod cache;
pub mod meta;
pub mod resolver;
pub mod types;
pub mod walker;

pub use cache::{CollectionChoice, MetadataCache, TRIGGERS_SLOT};
pub use meta::{MetaGlobal, MetaGlobals, WorkstepSummary};
pub use resolver::{CollectionSet, MetadataResolver};
pub use types::{Collection, CollectionNode, ExampleResponse, WorkstepNode};
