// handlers/elevated - tenant lifecycle under /api/:region/:env/root/*
//
// These create and destroy whole databases and rewrite the admin `apps`
// collection; deployments are expected to restrict them at the edge.

pub mod databases;
