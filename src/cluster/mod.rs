//! Text clustering: vectorize event descriptions, then group them.

pub mod kmeans;
pub mod stop_words;
pub mod vectorizer;

pub use kmeans::{ClusterFit, KMeans};
pub use vectorizer::TfIdfVectorizer;
