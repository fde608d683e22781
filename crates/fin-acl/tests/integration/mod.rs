mod caching;
mod concurrency;
mod failures;
mod groups;
mod multiple_acls;
mod propagation;
mod resolution;
