pub mod agency;
pub mod problem_report;
pub mod route;
pub mod service;
pub mod shape;
pub mod stop;
pub mod trip;
