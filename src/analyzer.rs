//! The analysis port: anything that turns an image into a caption plus candidates.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{AnalysisResult, ImageSource};
use crate::error::AnalysisError;

#[async_trait]
pub trait Analyzer: Send + Sync {
  async fn analyze(&self, image: &ImageSource) -> Result<AnalysisResult, AnalysisError>;
}

#[async_trait]
impl<T: Analyzer + ?Sized> Analyzer for Arc<T> {
  async fn analyze(&self, image: &ImageSource) -> Result<AnalysisResult, AnalysisError> {
    (**self).analyze(image).await
  }
}
