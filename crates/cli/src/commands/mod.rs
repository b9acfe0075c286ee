pub(crate) mod maintenance;
pub(crate) mod search;
pub(crate) mod serve;
