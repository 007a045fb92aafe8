//! Kafka transport backed by librdkafka.
//!
//! # Design Decisions
//! - Manual commits only (`enable.auto.commit=false`); the consumer loop
//!   decides when an offset is acknowledged
//! - New groups start at the log end (`auto.offset.reset=latest`)
//! - Headers are copied verbatim in both directions, duplicates included
//! - Async commit outcomes arrive on the client's poll thread, so
//!   [`CommitReporter`] logs and counts them there

use async_trait::async_trait;
use rdkafka::client::ClientContext;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{CommitMode, Consumer, ConsumerContext, StreamConsumer};
use rdkafka::error::KafkaResult;
use rdkafka::message::{Header, Headers, Message, OwnedHeaders};
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use rdkafka::{Offset, TopicPartitionList};

use crate::config::BrokerConfig;
use crate::observability::metrics;
use crate::queue::message::{Delivery, HeaderBag, OutboundMessage, QueueMessage};
use crate::queue::transport::{MessagePublisher, MessageSource, TransportError};

/// Publisher writing to a Kafka cluster.
pub struct KafkaPublisher {
    producer: FutureProducer,
}

impl KafkaPublisher {
    pub fn connect(config: &BrokerConfig) -> Result<Self, TransportError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &config.brokers)
            .set("message.timeout.ms", config.publish_timeout_ms.to_string())
            .create()
            .map_err(|e| TransportError::Publish(e.to_string()))?;

        tracing::info!(brokers = %config.brokers, "Kafka producer initialized");
        Ok(Self { producer })
    }
}

#[async_trait]
impl MessagePublisher for KafkaPublisher {
    async fn publish(&self, message: OutboundMessage) -> Result<Delivery, TransportError> {
        let mut headers = OwnedHeaders::new_with_capacity(message.headers.len());
        for (key, value) in message.headers.iter() {
            headers = headers.insert(Header {
                key,
                value: Some(value),
            });
        }

        let record = FutureRecord::to(&message.topic)
            .key(&message.key)
            .payload(&message.value)
            .headers(headers);

        match self.producer.send(record, Timeout::Never).await {
            Ok((partition, offset)) => Ok(Delivery { partition, offset }),
            Err((e, _)) => Err(TransportError::Publish(e.to_string())),
        }
    }

    fn system(&self) -> &'static str {
        "kafka"
    }
}

/// Consumer context reporting the result of asynchronous offset commits.
pub struct CommitReporter;

impl ClientContext for CommitReporter {}

impl ConsumerContext for CommitReporter {
    fn commit_callback(&self, result: KafkaResult<()>, offsets: &TopicPartitionList) {
        match result {
            Ok(()) => tracing::debug!(offsets = ?offsets, "Offsets committed"),
            Err(e) => {
                metrics::record_commit_error();
                tracing::error!(error = %e, offsets = ?offsets, "Failed to commit offset");
            }
        }
    }
}

/// Group member reading one Kafka topic.
pub struct KafkaSource {
    consumer: StreamConsumer<CommitReporter>,
}

impl KafkaSource {
    pub fn connect(config: &BrokerConfig, topic: &str, group_id: &str) -> Result<Self, TransportError> {
        let consumer: StreamConsumer<CommitReporter> = ClientConfig::new()
            .set("bootstrap.servers", &config.brokers)
            .set("group.id", group_id)
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", "latest")
            .create_with_context(CommitReporter)
            .map_err(|e| TransportError::Fetch(e.to_string()))?;

        consumer
            .subscribe(&[topic])
            .map_err(|e| TransportError::Fetch(e.to_string()))?;

        tracing::info!(
            brokers = %config.brokers,
            topic = %topic,
            group_id = %group_id,
            "Kafka consumer initialized"
        );
        Ok(Self { consumer })
    }
}

#[async_trait]
impl MessageSource for KafkaSource {
    async fn fetch(&self) -> Result<QueueMessage, TransportError> {
        let borrowed = self
            .consumer
            .recv()
            .await
            .map_err(|e| TransportError::Fetch(e.to_string()))?;

        let headers = borrowed
            .headers()
            .map(|headers| {
                headers
                    .iter()
                    .map(|h| (h.key.to_string(), h.value.map(<[u8]>::to_vec).unwrap_or_default()))
                    .collect::<HeaderBag>()
            })
            .unwrap_or_default();

        Ok(QueueMessage {
            topic: borrowed.topic().to_string(),
            key: borrowed.key().map(<[u8]>::to_vec).unwrap_or_default(),
            value: borrowed.payload().map(<[u8]>::to_vec).unwrap_or_default(),
            headers,
            offset: borrowed.offset(),
            partition: borrowed.partition(),
        })
    }

    async fn commit(&self, message: &QueueMessage) -> Result<(), TransportError> {
        let mut partitions = TopicPartitionList::new();
        partitions
            .add_partition_offset(&message.topic, message.partition, Offset::Offset(message.offset + 1))
            .map_err(|e| TransportError::Commit(e.to_string()))?;

        self.consumer
            .commit(&partitions, CommitMode::Async)
            .map_err(|e| TransportError::Commit(e.to_string()))
    }

    fn system(&self) -> &'static str {
        "kafka"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_util::debugging::{DebugValue, DebuggingRecorder};
    use rdkafka::error::{KafkaError, RDKafkaErrorCode};

    fn commit_errors(recorder: &DebuggingRecorder) -> u64 {
        recorder
            .snapshotter()
            .snapshot()
            .into_vec()
            .into_iter()
            .find_map(|(key, _, _, value)| match value {
                DebugValue::Counter(n) if key.key().name() == "consumer_commit_errors_total" => Some(n),
                _ => None,
            })
            .unwrap_or(0)
    }

    fn offsets() -> TopicPartitionList {
        let mut list = TopicPartitionList::new();
        list.add_partition_offset("trace-events", 0, Offset::Offset(8)).unwrap();
        list
    }

    #[test]
    fn test_failed_async_commit_is_counted() {
        let recorder = DebuggingRecorder::new();
        ::metrics::with_local_recorder(&recorder, || {
            CommitReporter.commit_callback(
                Err(KafkaError::ConsumerCommit(RDKafkaErrorCode::CoordinatorNotAvailable)),
                &offsets(),
            );
        });
        assert_eq!(commit_errors(&recorder), 1);
    }

    #[test]
    fn test_successful_async_commit_is_not_counted() {
        let recorder = DebuggingRecorder::new();
        ::metrics::with_local_recorder(&recorder, || {
            CommitReporter.commit_callback(Ok(()), &offsets());
        });
        assert_eq!(commit_errors(&recorder), 0);
    }
}
