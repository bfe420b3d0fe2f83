mod bucket_name;
mod object_key;
mod prefix;

pub use bucket_name::BucketName;
pub use object_key::ObjectKey;
pub use prefix::Prefix;
