//! Usage: Fanvue REST API access (client, credentials, session, pagination, typed records).

pub(crate) mod client;
pub(crate) mod credentials;
pub(crate) mod models;
pub(crate) mod pagination;
pub(crate) mod session;
