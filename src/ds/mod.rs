pub mod bucket;
pub mod bucket_array;
pub mod sample_ring;

pub use bucket::Bucket;
pub use bucket_array::{BucketArray, MinimumBucket};
pub use sample_ring::SampleRing;
