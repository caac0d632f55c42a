mod queue_dispatcher;

pub use queue_dispatcher::QueueDispatcher;
