pub mod outcome;
pub mod project;
pub mod record;
