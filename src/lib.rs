// Bedrock World Manager - import and export Bedrock worlds for server containers

pub mod commands;
pub mod config;
pub mod docker;
pub mod storage;
pub mod validation;
pub mod worlds;
