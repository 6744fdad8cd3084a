pub mod bounds;
pub mod path_commands;
pub mod vector_network;
