pub mod student;

pub use student::{Gender, NewStudent, Student, StudentPatch};
