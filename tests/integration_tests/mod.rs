
mod mod_codec;
mod mod_model;
mod mod_registry;
