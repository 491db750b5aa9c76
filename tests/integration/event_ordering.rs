//! Every subscriber of a session sees the same gap-free event sequence.

use std::sync::Arc;

use futures::StreamExt;
use leadgen::source::SourceAdapter;
use leadgen::{GenerationEvent, SessionStatus};

use crate::integration::test_utils::{
    collect_events, petshop_request, service, valid_candidates, GatedSource, RecordingSource,
};

#[tokio::test]
async fn subscribers_see_identical_sequences() {
    let gate = GatedSource::new(valid_candidates(0, 40));
    let (service, _) = service(vec![("gated", gate.clone() as Arc<dyn SourceAdapter>)]);

    let id = service.start(petshop_request(35)).unwrap();
    let early = service.subscribe(&id).unwrap();
    gate.entered.notified().await;
    let mid = service.subscribe(&id).unwrap();

    let first = tokio::spawn(early.into_stream().collect::<Vec<_>>());
    let second = tokio::spawn(mid.into_stream().collect::<Vec<_>>());
    gate.release.notify_one();

    let first = first.await.unwrap();
    let second = second.await.unwrap();
    assert_eq!(first, second);

    let seqs: Vec<u64> = first.iter().map(|e| e.seq).collect();
    let expected: Vec<u64> = (1..=first.len() as u64).collect();
    assert_eq!(seqs, expected);
    assert!(first.iter().all(|e| e.session_id == id));
}

#[tokio::test]
async fn late_subscriber_replays_the_whole_session() {
    let source = RecordingSource::new(valid_candidates(0, 3));
    let (service, _) = service(vec![("a", source as Arc<dyn SourceAdapter>)]);

    let id = service.start(petshop_request(3)).unwrap();
    service.wait(&id).await.unwrap();

    let events = collect_events(&service, &id).await;
    // enter source, three accepted leads, trailing batch, final progress, completed
    assert_eq!(events.len(), 7);
    assert_eq!(events[0].seq, 1);
    match &events[0].event {
        GenerationEvent::Progress(p) => {
            assert_eq!(p.current_source, "a");
            assert_eq!(p.valid, 0);
            assert_eq!(p.status, SessionStatus::Running);
        }
        other => panic!("expected progress, got {other:?}"),
    }
    assert!(matches!(
        events[4].event,
        GenerationEvent::Batch { batch_number: 1, .. }
    ));
    assert!(matches!(
        events[6].event,
        GenerationEvent::Completed { total_valid: 3 }
    ));

    let again = collect_events(&service, &id).await;
    assert_eq!(events, again);
}

#[tokio::test]
async fn progress_percentages_never_decrease() {
    let source = RecordingSource::new(valid_candidates(0, 9));
    let (service, _) = service(vec![("a", source as Arc<dyn SourceAdapter>)]);

    let id = service.start(petshop_request(9)).unwrap();
    let percentages: Vec<u8> = collect_events(&service, &id)
        .await
        .into_iter()
        .filter_map(|e| match e.event {
            GenerationEvent::Progress(p) => Some(p.percentage),
            _ => None,
        })
        .collect();

    assert!(percentages.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(percentages.last(), Some(&100));
    assert!(percentages.contains(&11));
    assert!(percentages.contains(&33));
}
