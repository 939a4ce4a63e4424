//! 服务层
//!
//! 引擎对外的五个操作都在这里：
//!
//! - `award_service`: 单用户实时评估与仓库批量评估
//! - `import_service`: 仓库导入与同步
//! - `query_service`: 徽章进度查询与授予确认
//! - `dto`: 数据传输对象定义

pub mod award_service;
pub mod dto;
pub mod import_service;
pub mod query_service;

pub use award_service::{AwardService, ContributionAwarder};
#[cfg(any(test, feature = "mock"))]
pub use award_service::MockContributionAwarder;
pub use dto::*;
pub use import_service::ImportService;
pub use query_service::BadgeQueryService;
