pub mod history;
pub mod measurement;
pub mod profile;
pub mod reference;
pub mod workspace;
