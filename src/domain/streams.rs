//! Pure functions deriving intermediate stream and NATS consumer names from
//! `(pipeline_id, topic_name)`. These form the wiring contract between data
//! plane stages and must be stable across restarts, so every function here
//! is a deterministic string formatter with no I/O.

pub fn consumer_group(pipeline_id: &str) -> String {
    format!("pc-{pipeline_id}")
}

pub fn ingestor_stream(pipeline_id: &str, topic: &str) -> String {
    format!("{pipeline_id}.{topic}.ingestor")
}

pub fn dedup_output_stream(pipeline_id: &str, topic: &str) -> String {
    format!("{pipeline_id}.{topic}.dedup")
}

pub fn joined_stream(pipeline_id: &str) -> String {
    format!("{pipeline_id}.joined")
}

pub fn dlq_stream(pipeline_id: &str) -> String {
    format!("{pipeline_id}.dlq")
}

pub fn nats_subject(pipeline_id: &str, topic: &str) -> String {
    format!("pc.{pipeline_id}.{topic}")
}

pub fn ingestor_consumer(pipeline_id: &str, topic: &str) -> String {
    format!("{pipeline_id}-{topic}-ingestor")
}

pub fn dedup_consumer(pipeline_id: &str, topic: &str) -> String {
    format!("{pipeline_id}-{topic}-dedup")
}

pub fn join_left_consumer(pipeline_id: &str, topic: &str) -> String {
    format!("{pipeline_id}-{topic}-join-left")
}

pub fn join_right_consumer(pipeline_id: &str, topic: &str) -> String {
    format!("{pipeline_id}-{topic}-join-right")
}

pub fn sink_consumer(pipeline_id: &str) -> String {
    format!("{pipeline_id}-sink")
}
