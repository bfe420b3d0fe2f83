mod storage_client;

pub use storage_client::{
    ClientFactory, DeleteObjectsOutput, ListPage, ListRequest, StorageClient, MAX_DELETE_KEYS,
};
