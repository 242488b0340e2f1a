/// 触发器模块 - 触发文件存储、场景调度与外部运行器
pub mod memory;
pub mod model;
pub mod printer;
pub mod report;
pub mod runner;
pub mod scheduler;
pub mod serialization;
pub mod store;
pub mod watcher;

pub use model::{TriggerKind, TriggerRecord};
pub use report::{Report, ReportRenderer};
pub use runner::{CommandRunner, RunLog, ScenarioRunner};
pub use scheduler::{RunTicket, Scheduler, expand};
pub use store::TriggerStore;
pub use watcher::{TriggerBatch, TriggerDispatcher, TriggerWatcher};
