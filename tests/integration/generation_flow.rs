//! End-to-end generation runs against scripted sources.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use leadgen::service::{GenerationService, ServiceSettings};
use leadgen::source::SourceAdapter;
use leadgen::store::LeadStore;
use leadgen::{GenerationEvent, RawCandidate, SessionStatus};

use crate::integration::test_utils::{
    collect_events, kinds, petshop_request, registry, service, service_with_store,
    valid_candidates, FailingSource, FailingStore, PanickingSource, PanickingStore,
    RecordingSource,
};

#[tokio::test]
async fn petshop_scenario_stops_at_target_and_hints_remaining_count() {
    let a = RecordingSource::new(vec![
        RawCandidate::named("Pet Feliz").with_phone("(41) 3333-0001"),
        RawCandidate::named("Aquario Azul").with_email("contato@aquarioazul.com.br"),
        RawCandidate::named("Dog House")
            .with_phone("41 3333 0003")
            .with_website("https://doghouse.com.br"),
    ]);
    let b = RecordingSource::new(vec![
        RawCandidate::named("Banho e Tosa Curitiba").with_phone("4133330004"),
        RawCandidate::named("Clinica Veterinaria Sao Bento").with_phone("4133330005"),
        RawCandidate::named("Racoes Premium").with_phone("4133330006"),
        RawCandidate::named("Gato Mia").with_phone("4133330007"),
    ]);
    let (service, store) = service(vec![
        ("a", a.clone() as Arc<dyn SourceAdapter>),
        ("b", b.clone() as Arc<dyn SourceAdapter>),
    ]);

    let id = service.start(petshop_request(5)).unwrap();
    let snapshot = service.wait(&id).await.unwrap();
    let events = collect_events(&service, &id).await;

    assert_eq!(snapshot.status, SessionStatus::Completed);
    assert_eq!(snapshot.valid, 5);
    assert_eq!(snapshot.generated, 5);
    assert_eq!(snapshot.percentage, 100);

    assert_eq!(a.queries()[0].count, 5);
    assert_eq!(b.calls(), 1);
    assert_eq!(b.queries()[0].count, 2);
    assert_eq!(b.queries()[0].niche, "petshop");
    assert_eq!(b.queries()[0].country, "Brasil");

    let batches: Vec<usize> = events
        .iter()
        .filter_map(|e| match &e.event {
            GenerationEvent::Batch { leads, .. } => Some(leads.len()),
            _ => None,
        })
        .collect();
    assert!(batches.len() <= 1);
    assert!(batches.iter().all(|n| *n <= 5));

    let tail = kinds(&events[events.len() - 2..]);
    assert_eq!(tail, vec!["progress", "completed"]);
    match &events.last().unwrap().event {
        GenerationEvent::Completed { total_valid } => assert_eq!(*total_valid, 5),
        other => panic!("expected completed, got {other:?}"),
    }

    assert_eq!(store.len(), 5);
    let leads = service.session_leads(&id).unwrap();
    assert_eq!(leads.len(), 5);
    assert_eq!(leads[0].name, "Pet Feliz");
    assert_eq!(leads[0].phone.as_deref(), Some("4133330001"));
    assert_eq!(leads[4].name, "Clinica Veterinaria Sao Bento");
    assert_eq!(leads[4].source.as_str(), "b");
}

#[tokio::test]
async fn full_batches_of_thirty_then_flushed_remainder() {
    let source = RecordingSource::new(valid_candidates(0, 70));
    let (service, _) = service(vec![("maps", source as Arc<dyn SourceAdapter>)]);

    let id = service.start(petshop_request(65)).unwrap();
    let events = collect_events(&service, &id).await;

    let batches: Vec<(u32, usize)> = events
        .iter()
        .filter_map(|e| match &e.event {
            GenerationEvent::Batch {
                batch_number,
                leads,
            } => Some((*batch_number, leads.len())),
            _ => None,
        })
        .collect();
    assert_eq!(batches, vec![(1, 30), (2, 30), (3, 5)]);
    assert_eq!(service.progress(&id).unwrap().valid, 65);
    assert_eq!(service.progress(&id).unwrap().generated, 65);
}

#[tokio::test]
async fn partial_batch_is_withheld_when_flushing_is_disabled() {
    let mut settings = ServiceSettings::default();
    settings.run.flush_partial_batch = false;
    let source = RecordingSource::new(valid_candidates(0, 40));
    let service = GenerationService::new(
        registry(vec![("maps", source as Arc<dyn SourceAdapter>)]),
        Arc::new(leadgen::store::MemoryLeadStore::new()),
        settings,
    );

    let id = service.start(petshop_request(35)).unwrap();
    let events = collect_events(&service, &id).await;
    let batch_count = events
        .iter()
        .filter(|e| matches!(e.event, GenerationEvent::Batch { .. }))
        .count();
    assert_eq!(batch_count, 1);
    assert_eq!(service.session_leads(&id).unwrap().len(), 35);
}

#[tokio::test]
async fn failing_and_panicking_sources_are_skipped() {
    let good = RecordingSource::new(valid_candidates(0, 3));
    let (service, _) = service(vec![
        ("broken", Arc::new(FailingSource) as Arc<dyn SourceAdapter>),
        ("crashy", Arc::new(PanickingSource) as Arc<dyn SourceAdapter>),
        ("good", good.clone() as Arc<dyn SourceAdapter>),
    ]);

    let id = service.start(petshop_request(3)).unwrap();
    let snapshot = service.wait(&id).await.unwrap();
    assert_eq!(snapshot.status, SessionStatus::Completed);
    assert_eq!(snapshot.valid, 3);
    assert_eq!(snapshot.error, None);
    assert_eq!(good.queries()[0].count, 3);

    let visited: Vec<String> = collect_events(&service, &id)
        .await
        .into_iter()
        .filter_map(|e| match e.event {
            GenerationEvent::Progress(p) if p.generated == 0 => Some(p.current_source),
            _ => None,
        })
        .collect();
    assert_eq!(visited, vec!["broken", "crashy", "good"]);
}

#[tokio::test]
async fn exhausted_sources_complete_below_target() {
    let a = RecordingSource::new(valid_candidates(0, 2));
    let b = RecordingSource::new(vec![
        RawCandidate::default(),
        RawCandidate::named("Sem Contato"),
    ]);
    let (service, _) = service(vec![
        ("a", a as Arc<dyn SourceAdapter>),
        ("b", b as Arc<dyn SourceAdapter>),
    ]);

    let id = service.start(petshop_request(10)).unwrap();
    let snapshot = service.wait(&id).await.unwrap();
    assert_eq!(snapshot.status, SessionStatus::Completed);
    assert_eq!(snapshot.valid, 2);
    assert_eq!(snapshot.generated, 4);
    assert_eq!(snapshot.percentage, 100);
}

#[tokio::test]
async fn later_sources_are_not_called_once_target_is_met() {
    let a = RecordingSource::new(valid_candidates(0, 10));
    let b = RecordingSource::new(valid_candidates(100, 10));
    let (service, store) = service(vec![
        ("a", a as Arc<dyn SourceAdapter>),
        ("b", b.clone() as Arc<dyn SourceAdapter>),
    ]);

    let id = service.start(petshop_request(4)).unwrap();
    let snapshot = service.wait(&id).await.unwrap();
    assert_eq!(snapshot.valid, 4);
    assert_eq!(snapshot.generated, 4);
    assert_eq!(b.calls(), 0);
    assert_eq!(store.len(), 4);
}

#[tokio::test]
async fn near_duplicates_across_sources_are_rejected() {
    let a = RecordingSource::new(vec![RawCandidate::named("John Silva").with_phone("4199990000")]);
    let b = RecordingSource::new(vec![
        RawCandidate::named("Jon Silva").with_phone("4199990001"),
        RawCandidate::named("Maria Costa").with_email("maria@costa.com"),
    ]);
    let (service, _) = service(vec![
        ("a", a as Arc<dyn SourceAdapter>),
        ("b", b as Arc<dyn SourceAdapter>),
    ]);

    let id = service.start(petshop_request(5)).unwrap();
    let snapshot = service.wait(&id).await.unwrap();
    assert_eq!(snapshot.valid, 2);
    assert_eq!(snapshot.generated, 3);
    let names: Vec<String> = service
        .session_leads(&id)
        .unwrap()
        .into_iter()
        .map(|l| l.name)
        .collect();
    assert_eq!(names, vec!["John Silva", "Maria Costa"]);
}

#[tokio::test]
async fn persistence_failures_do_not_stop_the_session() {
    let store = Arc::new(FailingStore::default());
    let source = RecordingSource::new(valid_candidates(0, 3));
    let service = service_with_store(
        vec![("a", source as Arc<dyn SourceAdapter>)],
        store.clone() as Arc<dyn LeadStore>,
    );

    let id = service.start(petshop_request(3)).unwrap();
    let snapshot = service.wait(&id).await.unwrap();
    assert_eq!(snapshot.status, SessionStatus::Completed);
    assert_eq!(snapshot.valid, 3);
    assert_eq!(store.attempts.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn internal_fault_errors_the_session_and_frees_the_slot() {
    let source = RecordingSource::new(valid_candidates(0, 3));
    let service = service_with_store(
        vec![("a", source as Arc<dyn SourceAdapter>)],
        Arc::new(PanickingStore),
    );

    let id = service.start(petshop_request(3)).unwrap();
    let snapshot = service.wait(&id).await.unwrap();
    assert_eq!(snapshot.status, SessionStatus::Errored);
    let error = snapshot.error.unwrap();
    assert!(error.contains("store invariant violated"), "{error}");
    assert!(!service.is_running());

    let events = collect_events(&service, &id).await;
    let tail = kinds(&events[events.len() - 2..]);
    assert_eq!(tail, vec!["progress", "error"]);

    let next = service.start(petshop_request(1));
    assert!(next.is_ok());
}
