pub mod admissions;
pub mod autofill;
