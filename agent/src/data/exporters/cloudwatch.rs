//! AWS CloudWatch export backend (`PutMetricData`)

use async_trait::async_trait;
use aws_sdk_cloudwatch::Client;
use aws_sdk_cloudwatch::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_cloudwatch::operation::put_metric_data::PutMetricDataError;
use aws_sdk_cloudwatch::primitives::DateTime as AwsDateTime;
use aws_sdk_cloudwatch::types::{Dimension as CwDimension, MetricDatum, StandardUnit};

use super::client::ExportClient;
use super::error::BackendError;
use super::profile::{BackendProfile, KindSupport};
use super::record::BackendRecord;
use crate::domain::metrics::MetricKind;

const BACKEND: &str = "cloudwatch";

/// CloudWatch accepts at most 150 datums per `PutMetricData` request.
/// Histograms have no CloudWatch mapping and are dropped.
pub static CLOUDWATCH_PROFILE: BackendProfile = BackendProfile {
    name: BACKEND,
    max_chunk_size: 150,
    kinds: &[
        (MetricKind::Counter, KindSupport::Value),
        (MetricKind::Gauge, KindSupport::Value),
        (MetricKind::Histogram, KindSupport::Drop),
    ],
};

/// Error codes CloudWatch returns when a caller exceeds its request quota
const THROTTLING_CODES: [&str; 3] = ["Throttling", "ThrottlingException", "RequestLimitExceeded"];

#[derive(Debug, Clone)]
pub struct CloudwatchExporter {
    client: Client,
}

impl CloudwatchExporter {
    /// Build a client from the default AWS provider chain
    ///
    /// `region` overrides the chain's region, `profile_name` selects a named
    /// profile from the shared AWS config/credentials files.
    pub async fn new(region: Option<String>, profile_name: Option<String>) -> Self {
        let mut config_loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = region {
            config_loader = config_loader.region(aws_sdk_cloudwatch::config::Region::new(region));
        }
        if let Some(ref profile) = profile_name {
            config_loader = config_loader.profile_name(profile);
        }
        let config = config_loader.load().await;

        tracing::debug!(
            region = ?config.region().map(|r| r.as_ref().to_string()),
            profile = ?profile_name,
            "CloudWatch client initialized"
        );
        Self::from_client(Client::new(&config))
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    fn datum(record: &BackendRecord) -> MetricDatum {
        let dimensions: Vec<CwDimension> = record
            .dimensions
            .iter()
            .map(|d| CwDimension::builder().name(&d.name).value(&d.value).build())
            .collect();

        MetricDatum::builder()
            .metric_name(&record.metric_name)
            .unit(StandardUnit::None)
            .value(record.value)
            .set_dimensions(Some(dimensions))
            .timestamp(AwsDateTime::from_secs(record.timestamp.timestamp()))
            .build()
    }

    fn classify<R>(err: SdkError<PutMetricDataError, R>) -> BackendError
    where
        R: std::fmt::Debug + 'static,
    {
        let message = DisplayErrorContext(&err).to_string();
        match err.as_service_error() {
            Some(service) if service.code().is_some_and(|c| THROTTLING_CODES.contains(&c)) => {
                BackendError::Throttled {
                    backend: BACKEND,
                    message,
                }
            }
            Some(_) => BackendError::rejected(BACKEND, message),
            None => BackendError::transport(BACKEND, message),
        }
    }
}

#[async_trait]
impl ExportClient for CloudwatchExporter {
    fn profile(&self) -> &'static BackendProfile {
        &CLOUDWATCH_PROFILE
    }

    async fn send(&self, namespace: &str, records: &[BackendRecord]) -> Result<(), BackendError> {
        let metric_data: Vec<MetricDatum> = records.iter().map(Self::datum).collect();

        self.client
            .put_metric_data()
            .namespace(namespace)
            .set_metric_data(Some(metric_data))
            .send()
            .await
            .map_err(Self::classify)?;

        tracing::trace!(namespace, datums = records.len(), "PutMetricData accepted");
        Ok(())
    }
}
