mod events;

pub use events::ShellEvent;
