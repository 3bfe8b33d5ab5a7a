// Interactive shell on top of the AdminApp state container.

pub mod commands;
pub mod render;
pub mod shell;
