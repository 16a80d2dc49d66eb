//! Catalog flows and classification against an in-process fake of the
//! remote service.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use porcelanidos_bot::{
    api::{ApiError, CrabApi},
    catalog::{Catalog, NewSpecimen},
    quiz::{encode, QuizSession, QUESTIONS},
    state::{settle_classification, State as ChatState},
};
use serde_json::{json, Map, Value};
use teloxide::dispatching::dialogue::{Dialogue, InMemStorage};
use teloxide::types::ChatId;
use tokio::sync::Notify;

#[derive(Default)]
struct FakeService {
    catalog: Mutex<Map<String, Value>>,
    fetches: AtomicUsize,
}

type Shared = Arc<FakeService>;

async fn catalogo(State(service): State<Shared>) -> Json<Value> {
    service.fetches.fetch_add(1, Ordering::SeqCst);
    Json(Value::Object(service.catalog.lock().unwrap().clone()))
}

async fn guardar(State(service): State<Shared>, Json(mut body): Json<Value>) -> Json<Value> {
    let id = body["nombreCientifico"].as_str().unwrap_or_default().replace(' ', "_");
    body["fechaAgregada"] = json!("2024-05-01T10:00:00Z");
    service.catalog.lock().unwrap().insert(id.clone(), body);
    Json(json!({"mensaje": "Especie guardada exitosamente", "especie": id}))
}

async fn borrar(State(service): State<Shared>, Path(id): Path<String>) -> Json<Value> {
    match service.catalog.lock().unwrap().remove(&id) {
        Some(_) => Json(json!({"mensaje": "Especie eliminada exitosamente", "especie": id})),
        None => Json(json!({"error": "No se encontro la especie"})),
    }
}

async fn cangrejos(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    match body["elementos"].as_array() {
        Some(slots) if slots.len() == 2 * QUESTIONS.len() => (
            StatusCode::OK,
            Json(json!({"mensaje": "Array procesado", "cangrejo": "Pachycheles_serratus"})),
        ),
        _ => (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "error al detectar"})),
        ),
    }
}

async fn failing() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "boom")
}

fn seeded() -> Shared {
    let service = FakeService::default();
    {
        let mut catalog = service.catalog.lock().unwrap();
        catalog.insert(
            "Pachycheles_serratus".to_string(),
            json!({"nombre": "Cangrejo aserrado", "imagen": "uploads/a.jpg"}),
        );
        catalog.insert(
            "Petrolisthes_galathinus".to_string(),
            json!({"nombre": "Cangrejo manchado", "fechaAgregada": "2023-02-10"}),
        );
    }
    Arc::new(service)
}

fn working_routes(service: Shared) -> Router {
    Router::new()
        .route("/catalogo", get(catalogo))
        .route("/guardar_especimen", post(guardar))
        .route("/borrar_especimen/:id", delete(borrar))
        .route("/cangrejos", post(cangrejos))
        .with_state(service)
}

fn failing_routes() -> Router {
    Router::new()
        .route("/catalogo", get(failing))
        .route("/guardar_especimen", post(failing))
        .route("/borrar_especimen/:id", delete(failing))
        .route("/cangrejos", post(|| async { "{not json" }))
}

/// Classifier that only answers once `gate` is notified.
fn gated_classifier(gate: Arc<Notify>) -> Router {
    Router::new().route(
        "/cangrejos",
        post(move || async move {
            gate.notified().await;
            Json(json!({"cangrejo": "Petrolisthes_armatus"}))
        }),
    )
}

async fn serve(app: Router) -> CrabApi {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    CrabApi::new(&format!("http://{addr}"), None).unwrap()
}

async fn loaded(api: &CrabApi) -> Catalog {
    let mut catalog = Catalog::default();
    catalog.refresh(api).await.unwrap();
    catalog
}

#[tokio::test]
async fn refresh_normalizes_remote_records() {
    let api = serve(working_routes(seeded())).await;
    let catalog = loaded(&api).await;

    assert_eq!(catalog.len(), 2);
    let serratus = catalog.get("Pachycheles_serratus").unwrap();
    assert_eq!(serratus.nombre, "Cangrejo aserrado");
    assert_eq!(serratus.nombre_cientifico, "Pachycheles serratus");
    assert_eq!(
        serratus.imagen.as_deref(),
        Some("src/assets/images/crab/caparazon_rugoso.jpg")
    );
    assert_eq!(
        catalog
            .get("Petrolisthes_galathinus")
            .unwrap()
            .fecha_agregada
            .format("%d/%m/%Y")
            .to_string(),
        "10/02/2023"
    );
}

#[tokio::test]
async fn add_refetches_server_assigned_fields() {
    let service = seeded();
    let api = serve(working_routes(service.clone())).await;
    let mut catalog = loaded(&api).await;
    assert_eq!(service.fetches.load(Ordering::SeqCst), 1);

    let specimen = NewSpecimen {
        nombre: "Cangrejo nodoso".to_string(),
        nombre_cientifico: "Clastotoechus nodosus".to_string(),
        habitat: "Bajo rocas".to_string(),
        preguntas_identificacion: encode(&[true, false, true, false, true, false, true, false]),
        ..NewSpecimen::default()
    };
    catalog.add(&api, &specimen).await.unwrap();

    assert_eq!(service.fetches.load(Ordering::SeqCst), 2);
    assert_eq!(catalog.len(), 3);
    let added = catalog.get("Clastotoechus_nodosus").unwrap();
    assert_eq!(added.habitat, "Bajo rocas");
    assert_eq!(added.tamano, "N/A");
    assert_eq!(added.preguntas_identificacion.len(), 16);
    assert_eq!(
        added.fecha_agregada.to_rfc3339(),
        "2024-05-01T10:00:00+00:00"
    );
}

#[tokio::test]
async fn delete_patches_locally_without_refetch() {
    let service = seeded();
    let api = serve(working_routes(service.clone())).await;
    let mut catalog = loaded(&api).await;

    assert!(catalog.delete(&api, "Pachycheles_serratus").await.unwrap());

    assert_eq!(service.fetches.load(Ordering::SeqCst), 1);
    assert_eq!(catalog.len(), 1);
    assert!(catalog.get("Pachycheles_serratus").is_none());
    assert!(!service
        .catalog
        .lock()
        .unwrap()
        .contains_key("Pachycheles_serratus"));
}

#[tokio::test]
async fn deleting_unknown_id_changes_nothing() {
    let api = serve(working_routes(seeded())).await;
    let mut catalog = loaded(&api).await;
    let before = catalog.clone();

    assert!(!catalog.delete(&api, "Neopisosoma_orientale").await.unwrap());
    assert_eq!(catalog, before);
}

#[tokio::test]
async fn failed_calls_leave_the_view_untouched() {
    let good = serve(working_routes(seeded())).await;
    let bad = serve(failing_routes()).await;
    let mut catalog = loaded(&good).await;
    let before = catalog.clone();

    let err = catalog.refresh(&bad).await.unwrap_err();
    assert!(matches!(err, ApiError::Status { status: 500, .. }), "{err}");
    assert_eq!(catalog, before);

    let specimen = NewSpecimen {
        nombre: "x".to_string(),
        nombre_cientifico: "y".to_string(),
        ..NewSpecimen::default()
    };
    assert!(catalog.add(&bad, &specimen).await.is_err());
    assert_eq!(catalog, before);

    assert!(catalog.delete(&bad, "Pachycheles_serratus").await.is_err());
    assert_eq!(catalog, before);
}

#[tokio::test]
async fn classifies_a_full_answer_vector() {
    let api = serve(working_routes(seeded())).await;
    let answers: Vec<bool> = QUESTIONS.iter().map(|q| q.correct_answer).collect();

    let species = api.classify(&encode(&answers)).await.unwrap();
    assert_eq!(species, "Pachycheles_serratus");
}

#[tokio::test]
async fn classification_failures_yield_unknown() {
    let answers = vec![true; QUESTIONS.len()];
    let vector = encode(&answers);

    // rejected by the service
    let api = serve(working_routes(seeded())).await;
    assert!(matches!(
        api.classify(&encode(&[true])).await,
        Err(ApiError::Status { status: 400, .. })
    ));
    assert_eq!(api.classify_or_unknown(&encode(&[true])).await, "");

    // unparseable body
    let bad = serve(failing_routes()).await;
    assert!(matches!(
        bad.classify(&vector).await,
        Err(ApiError::Parse(_))
    ));
    assert_eq!(bad.classify_or_unknown(&vector).await, "");
}

#[tokio::test]
async fn unreachable_service_is_a_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let api = CrabApi::new(&format!("http://{addr}"), None).unwrap();
    let mut catalog = Catalog::default();
    assert!(matches!(
        catalog.refresh(&api).await,
        Err(ApiError::Network(_))
    ));
    assert!(catalog.is_empty());
    assert_eq!(api.classify_or_unknown(&encode(&[false; 8])).await, "");
}

fn answered_session() -> QuizSession {
    let mut session = QuizSession::new();
    for question in QUESTIONS.iter() {
        session.answer(question.correct_answer);
    }
    session
}

#[tokio::test]
async fn classification_moves_waiting_chat_to_results() {
    let api = serve(working_routes(seeded())).await;
    let dialogue = Dialogue::new(InMemStorage::<ChatState>::new(), ChatId(7));
    let session = answered_session();
    dialogue
        .update(ChatState::AwaitingResult {
            session: session.clone(),
        })
        .await
        .unwrap();

    let outcome = settle_classification(&api, &dialogue, session)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(outcome.species, "Pachycheles_serratus");
    assert_eq!(outcome.score, 8);
    assert_eq!(
        dialogue.get().await.unwrap(),
        Some(ChatState::Results { outcome })
    );
}

#[tokio::test]
async fn result_arriving_after_going_home_is_dropped() {
    let gate = Arc::new(Notify::new());
    let api = serve(gated_classifier(gate.clone())).await;
    let dialogue = Dialogue::new(InMemStorage::<ChatState>::new(), ChatId(7));
    let session = answered_session();
    dialogue
        .update(ChatState::AwaitingResult {
            session: session.clone(),
        })
        .await
        .unwrap();

    let pending = tokio::spawn({
        let dialogue = dialogue.clone();
        async move { settle_classification(&api, &dialogue, session).await }
    });

    // the chat leaves while the classifier is still working
    dialogue.update(ChatState::Home).await.unwrap();
    gate.notify_one();

    assert_eq!(pending.await.unwrap().unwrap(), None);
    assert_eq!(dialogue.get().await.unwrap(), Some(ChatState::Home));
}

#[tokio::test]
async fn result_of_a_superseded_run_is_dropped() {
    let gate = Arc::new(Notify::new());
    let api = serve(gated_classifier(gate.clone())).await;
    let dialogue = Dialogue::new(InMemStorage::<ChatState>::new(), ChatId(7));
    let first = answered_session();
    dialogue
        .update(ChatState::AwaitingResult {
            session: first.clone(),
        })
        .await
        .unwrap();

    let pending = tokio::spawn({
        let dialogue = dialogue.clone();
        async move { settle_classification(&api, &dialogue, first).await }
    });

    // same answers, new run
    let mut retry = answered_session();
    retry.renew_token();
    let waiting = ChatState::AwaitingResult { session: retry };
    dialogue.update(waiting.clone()).await.unwrap();
    gate.notify_one();

    assert_eq!(pending.await.unwrap().unwrap(), None);
    assert_eq!(dialogue.get().await.unwrap(), Some(waiting));
}
