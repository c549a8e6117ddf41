pub mod dashboard;
pub mod market;
pub mod review;
pub mod tasks;
pub mod users;
pub mod words;
