pub mod class;
pub mod enrollment;
pub mod presence;
pub mod recap;

pub use class::{ClassInfo, NewClass};
pub use enrollment::{Enrollment, Role};
pub use presence::{Actor, BulkSetEntry, PresenceRecord, PresenceRequest, PresenceStatus};
pub use recap::{
    ClassMember, ClassRecap, ClassRecapRow, RecapEntry, StudentClassRecap, StudentMark,
    StudentRecap,
};
