// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Hello/Bye announcement plumbing.
//!
//! Outbound: [`AnnouncementClient`] stamps each announcement with the next
//! AppSequence and hands it to the transport. Inbound: [`AnnouncementSink`]
//! runs duplicate suppression on the announcement's message id and forwards
//! fresh announcements to an [`AnnouncementListener`].
//!
//! Listeners are called from transport receive threads; they must be
//! `Send + Sync` and must not block.

use crate::duplicate::DuplicateFilter;
use crate::error::Result;
use crate::record::EndpointRecord;
use crate::sequence::{new_message_id, AppSequence, SequenceGenerator};
use crate::transport::DiscoveryTransport;
use std::sync::Arc;

/// Callbacks for endpoint online/offline transitions observed on the wire.
pub trait AnnouncementListener: Send + Sync {
    /// An endpoint announced itself online.
    fn on_hello(&self, record: &EndpointRecord, sequence: &AppSequence);

    /// An endpoint announced it is going offline.
    fn on_bye(&self, record: &EndpointRecord, sequence: &AppSequence);
}

/// Outbound announcement sender for one endpoint.
pub struct AnnouncementClient {
    transport: Arc<dyn DiscoveryTransport>,
    sequencer: SequenceGenerator,
}

impl AnnouncementClient {
    /// Create a sender with its own wall-clock-derived sequence generator.
    pub fn new(transport: Arc<dyn DiscoveryTransport>) -> Self {
        Self::with_generator(transport, SequenceGenerator::new())
    }

    /// Create a sender stamping with an explicitly constructed generator.
    pub fn with_generator(
        transport: Arc<dyn DiscoveryTransport>,
        sequencer: SequenceGenerator,
    ) -> Self {
        Self {
            transport,
            sequencer,
        }
    }

    /// Announce `record` as online (Hello).
    ///
    /// # Errors
    /// `Error::SendFailed` if the transport rejects the send.
    pub fn announce_online(&self, record: &EndpointRecord) -> Result<()> {
        let message_id = new_message_id();
        let sequence = self.sequencer.next();
        log::debug!(
            "[announce] hello {} (seq={})",
            record.address(),
            sequence.message_number
        );
        self.transport.send_hello(&message_id, &sequence, record)
    }

    /// Announce `record` as going offline (Bye).
    pub fn announce_offline(&self, record: &EndpointRecord) -> Result<()> {
        let message_id = new_message_id();
        let sequence = self.sequencer.next();
        log::debug!(
            "[announce] bye {} (seq={})",
            record.address(),
            sequence.message_number
        );
        self.transport.send_bye(&message_id, &sequence, record)
    }
}

/// Inbound announcement receive path with duplicate suppression.
pub struct AnnouncementSink {
    duplicates: Arc<DuplicateFilter>,
    listener: Arc<dyn AnnouncementListener>,
}

impl AnnouncementSink {
    /// Wire a listener behind a duplicate window. Share the filter with the
    /// other receive paths of the same service instance.
    pub fn new(duplicates: Arc<DuplicateFilter>, listener: Arc<dyn AnnouncementListener>) -> Self {
        Self {
            duplicates,
            listener,
        }
    }

    /// Deliver a decoded Hello. Re-delivered message ids are dropped.
    pub fn hello_received(
        &self,
        message_id: &str,
        sequence: &AppSequence,
        record: EndpointRecord,
    ) {
        if self.duplicates.is_duplicate(message_id) {
            log::debug!("[announce] duplicate hello {} dropped", message_id);
            return;
        }
        self.listener.on_hello(&record, sequence);
    }

    /// Deliver a decoded Bye. Re-delivered message ids are dropped.
    pub fn bye_received(&self, message_id: &str, sequence: &AppSequence, record: EndpointRecord) {
        if self.duplicates.is_duplicate(message_id) {
            log::debug!("[announce] duplicate bye {} dropped", message_id);
            return;
        }
        self.listener.on_bye(&record, sequence);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::{FindCriteria, ResolveCriteria};
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingTransport {
        hellos: Mutex<Vec<(String, u64)>>,
        byes: Mutex<Vec<String>>,
    }

    impl DiscoveryTransport for RecordingTransport {
        fn send_probe(&self, _: &str, _: &AppSequence, _: &FindCriteria) -> Result<()> {
            Ok(())
        }
        fn send_resolve(&self, _: &str, _: &AppSequence, _: &ResolveCriteria) -> Result<()> {
            Ok(())
        }
        fn send_probe_matches(&self, _: &str, _: &AppSequence, _: &[EndpointRecord]) -> Result<()> {
            Ok(())
        }
        fn send_resolve_match(&self, _: &str, _: &AppSequence, _: &EndpointRecord) -> Result<()> {
            Ok(())
        }
        fn send_hello(
            &self,
            _message_id: &str,
            sequence: &AppSequence,
            record: &EndpointRecord,
        ) -> Result<()> {
            self.hellos
                .lock()
                .push((record.address().to_owned(), sequence.message_number));
            Ok(())
        }
        fn send_bye(
            &self,
            _message_id: &str,
            _sequence: &AppSequence,
            record: &EndpointRecord,
        ) -> Result<()> {
            self.byes.lock().push(record.address().to_owned());
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingListener {
        hellos: Mutex<Vec<String>>,
        byes: Mutex<Vec<String>>,
    }

    impl AnnouncementListener for RecordingListener {
        fn on_hello(&self, record: &EndpointRecord, _sequence: &AppSequence) {
            self.hellos.lock().push(record.address().to_owned());
        }
        fn on_bye(&self, record: &EndpointRecord, _sequence: &AppSequence) {
            self.byes.lock().push(record.address().to_owned());
        }
    }

    fn record(address: &str) -> EndpointRecord {
        EndpointRecord::builder(address).build().expect("valid record")
    }

    fn sequence(n: u64) -> AppSequence {
        AppSequence {
            instance_id: 7,
            sequence_id: None,
            message_number: n,
        }
    }

    #[test]
    fn test_announcements_stamp_increasing_sequence() {
        let transport = Arc::new(RecordingTransport::default());
        let client = AnnouncementClient::new(Arc::clone(&transport) as Arc<dyn DiscoveryTransport>);

        let printer = record("urn:uuid:printer");
        client.announce_online(&printer).expect("hello sent");
        client.announce_online(&printer).expect("hello sent");
        client.announce_offline(&printer).expect("bye sent");

        let hellos = transport.hellos.lock();
        assert_eq!(hellos.len(), 2);
        assert_eq!(hellos[0].1, 1);
        assert_eq!(hellos[1].1, 2);
        assert_eq!(*transport.byes.lock(), vec!["urn:uuid:printer".to_owned()]);
    }

    #[test]
    fn test_sink_forwards_fresh_announcements() {
        let listener = Arc::new(RecordingListener::default());
        let filter = Arc::new(DuplicateFilter::new(16).expect("valid capacity"));
        let sink = AnnouncementSink::new(filter, listener.clone());

        sink.hello_received("urn:uuid:m1", &sequence(1), record("urn:uuid:a"));
        sink.bye_received("urn:uuid:m2", &sequence(2), record("urn:uuid:a"));

        assert_eq!(*listener.hellos.lock(), vec!["urn:uuid:a".to_owned()]);
        assert_eq!(*listener.byes.lock(), vec!["urn:uuid:a".to_owned()]);
    }

    #[test]
    fn test_sink_drops_redelivered_message_id() {
        let listener = Arc::new(RecordingListener::default());
        let filter = Arc::new(DuplicateFilter::new(16).expect("valid capacity"));
        let sink = AnnouncementSink::new(filter, listener.clone());

        sink.hello_received("urn:uuid:m1", &sequence(1), record("urn:uuid:a"));
        sink.hello_received("urn:uuid:m1", &sequence(1), record("urn:uuid:a"));

        assert_eq!(listener.hellos.lock().len(), 1);
    }
}
