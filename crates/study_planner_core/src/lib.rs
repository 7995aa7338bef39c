pub mod domain;
pub mod planner;
pub mod pomodoro;
pub mod ports;
pub mod seed;
pub mod validation;
pub mod views;

pub use domain::{
    CurrentUser, NewStudySession, NewStudyTimeRecord, NewSubject, NewTask, NewUser,
    Priority, StudySession, StudySessionPatch, StudyTimeRecord, StudyTimeRecordPatch, Subject,
    SubjectPatch, Task, TaskPatch, Upsert, User, UserCredentials, UserPatch, UserSettings,
};
pub use planner::Planner;
pub use ports::{DatabaseService, PortError, PortResult};
pub use seed::{seed_sample_data, SeedSummary};
