pub mod detector;
pub mod event;
pub mod mode;
pub mod session;
pub mod shell;
pub mod timers;
