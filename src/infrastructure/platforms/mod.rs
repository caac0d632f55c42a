mod scripted_adapter;

pub use scripted_adapter::ScriptedPlatformAdapter;
