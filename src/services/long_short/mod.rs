pub mod collector;
pub mod schedule;
pub mod scheduler;

pub use collector::DataCollectionService;
pub use scheduler::DataScheduler;
