pub mod file;
pub mod job;
pub mod processing_log;
pub mod quota;
pub mod user;

pub use file::{
    FileDetailResponse, FileListQuery, FilePage, FileRecord, FileResponse, FileStatus, Pagination,
    UploadRequest,
};
pub use job::{JobStatus, ProcessingJob};
pub use processing_log::{ProcessingLog, ProcessingLogResponse, UsageDelta};
pub use quota::UserQuota;
pub use user::{Caller, Role};
