use std::sync::Arc;

use dotenv::dotenv;
use porcelanidos_bot::{
    api::CrabApi,
    catalog::{Catalog, SpecimenDraft},
    config::Config,
    quiz::{Progress, QuizOutcome, QuizSession, QUESTIONS},
    render,
    state::{settle_classification, State},
};
use teloxide::{
    dispatching::dialogue::{serializer::Json, ErasedStorage, SqliteStorage, Storage},
    prelude::*,
    types::{ChatAction, ChatId, KeyboardButton, KeyboardMarkup, ParseMode},
};

type CrabDialogue = Dialogue<State, ErasedStorage<State>>;
type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;
type DialogueStorage = std::sync::Arc<ErasedStorage<State>>;

const START_QUIZ: &str = "Iniciar cuestionario";
const BROWSE_SPECIES: &str = "Ver especies";
const RESTART_QUIZ: &str = "Reiniciar cuestionario";
const SAVE_RESULT: &str = "Guardar en catálogo";
const BACK_HOME: &str = "Volver a inicio";
const ADD_SPECIES: &str = "Agregar especie";
const DELETE_SPECIES: &str = "Eliminar especie";
const REFRESH: &str = "Actualizar";
const CANCEL: &str = "Cancelar";
const YES: &str = "Sí, eliminar";
const NO: &str = "No";

#[tokio::main]
async fn main() {
    dotenv().ok();
    pretty_env_logger::init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    log::info!("Starting porcelain crab bot against {}", config.api_url);

    let api = match CrabApi::new(&config.api_url, Some(config.http_timeout)) {
        Ok(api) => Arc::new(api),
        Err(e) => {
            log::error!("Cannot build service client: {}", e);
            std::process::exit(1);
        }
    };

    log::info!("Opening dialogue storage at {}", config.db_path);
    let storage: DialogueStorage = match SqliteStorage::open(&config.db_path, Json).await {
        Ok(storage) => storage.erase(),
        Err(e) => {
            log::error!("Cannot open {}: {}", config.db_path, e);
            std::process::exit(1);
        }
    };

    let bot = Bot::new(config.bot_token);

    Dispatcher::builder(
        bot,
        Update::filter_message()
            .enter_dialogue::<Message, ErasedStorage<State>, State>()
            .branch(dptree::filter(|msg: Message| msg.text() == Some("/start")).endpoint(start))
            .branch(dptree::case![State::Start].endpoint(start))
            .branch(dptree::case![State::Home].endpoint(home))
            .branch(dptree::case![State::Quiz { session }].endpoint(quiz))
            .branch(dptree::case![State::AwaitingResult { session }].endpoint(awaiting_result))
            .branch(dptree::case![State::Results { outcome }].endpoint(results))
            .branch(dptree::case![State::Species { catalog }].endpoint(species))
            .branch(dptree::case![State::AddSpecies { catalog, draft }].endpoint(add_species))
            .branch(dptree::case![State::DeleteSpecies { catalog }].endpoint(delete_species))
            .branch(dptree::case![State::ConfirmDelete { catalog, id }].endpoint(confirm_delete)),
    )
    .dependencies(dptree::deps![storage, api])
    .enable_ctrlc_handler()
    .build()
    .dispatch()
    .await;
}

fn keyboard(rows: &[&[&str]]) -> KeyboardMarkup {
    KeyboardMarkup::new(
        rows.iter()
            .map(|row| row.iter().map(|label| KeyboardButton::new(*label)).collect::<Vec<_>>())
            .collect::<Vec<_>>(),
    )
}

fn home_keyboard() -> KeyboardMarkup {
    keyboard(&[&[START_QUIZ, BROWSE_SPECIES]])
}

fn results_keyboard() -> KeyboardMarkup {
    keyboard(&[&[RESTART_QUIZ, SAVE_RESULT], &[BACK_HOME]])
}

fn species_keyboard() -> KeyboardMarkup {
    keyboard(&[&[ADD_SPECIES, DELETE_SPECIES], &[REFRESH, BACK_HOME]])
}

async fn start(bot: Bot, dialogue: CrabDialogue, msg: Message) -> HandlerResult {
    show_home(&bot, &dialogue, &msg).await
}

async fn show_home(bot: &Bot, dialogue: &CrabDialogue, msg: &Message) -> HandlerResult {
    bot.send_message(msg.chat.id, render::HOME_TEXT)
        .parse_mode(ParseMode::Html)
        .reply_markup(home_keyboard())
        .await?;
    dialogue.update(State::Home).await?;
    Ok(())
}

async fn home(api: Arc<CrabApi>, bot: Bot, dialogue: CrabDialogue, msg: Message) -> HandlerResult {
    match msg.text() {
        Some(START_QUIZ) => start_quiz(&bot, &dialogue, &msg).await,
        Some(BROWSE_SPECIES) => {
            let mut catalog = Catalog::default();
            load_catalog(&api, &bot, &msg, &mut catalog).await?;
            show_species(&bot, &dialogue, &msg, catalog, None).await
        }
        _ => show_home(&bot, &dialogue, &msg).await,
    }
}

async fn start_quiz(bot: &Bot, dialogue: &CrabDialogue, msg: &Message) -> HandlerResult {
    let session = QuizSession::new();
    log::debug!("Chat {} starts quiz {}", msg.chat.id, session.token());
    ask(bot, msg, &session).await?;
    dialogue.update(State::Quiz { session }).await?;
    Ok(())
}

async fn ask(bot: &Bot, msg: &Message, session: &QuizSession) -> HandlerResult {
    let Some(question) = session.current_question() else {
        return Ok(());
    };
    bot.send_message(
        msg.chat.id,
        render::question(session.question_number() + 1, QUESTIONS.len(), question),
    )
    .parse_mode(ParseMode::Html)
    .reply_markup(keyboard(&[&[question.options[0]], &[question.options[1]], &[BACK_HOME]]))
    .await?;
    Ok(())
}

async fn quiz(
    api: Arc<CrabApi>,
    bot: Bot,
    dialogue: CrabDialogue,
    mut session: QuizSession,
    msg: Message,
) -> HandlerResult {
    let text = msg.text().unwrap_or_default();
    if text == BACK_HOME {
        return show_home(&bot, &dialogue, &msg).await;
    }

    let answer = session
        .current_question()
        .and_then(|question| question.answer_for(text));
    let Some(answer) = answer else {
        bot.send_message(msg.chat.id, "Por favor, elige una de las dos opciones")
            .await?;
        return ask(&bot, &msg, &session).await;
    };

    match session.answer(answer) {
        Progress::Next(_) => {
            ask(&bot, &msg, &session).await?;
            dialogue.update(State::Quiz { session }).await?;
            Ok(())
        }
        Progress::Complete => finish_quiz(api, &bot, &dialogue, &msg, session).await,
    }
}

/// Moves the chat to the waiting screen and classifies in the background, so
/// the chat can still go home or restart meanwhile.
async fn finish_quiz(
    api: Arc<CrabApi>,
    bot: &Bot,
    dialogue: &CrabDialogue,
    msg: &Message,
    session: QuizSession,
) -> HandlerResult {
    dialogue
        .update(State::AwaitingResult {
            session: session.clone(),
        })
        .await?;
    bot.send_message(msg.chat.id, "🔬 Identificando la especie…")
        .reply_markup(keyboard(&[&[RESTART_QUIZ, BACK_HOME]]))
        .await?;
    bot.send_chat_action(msg.chat.id, ChatAction::Typing).await?;

    let bot = bot.clone();
    let dialogue = dialogue.clone();
    let chat_id = msg.chat.id;
    tokio::spawn(async move {
        if let Err(e) = show_results(&api, &bot, &dialogue, chat_id, session).await {
            log::error!("Error showing results in chat {}: {}", chat_id, e);
        }
    });
    Ok(())
}

async fn show_results(
    api: &CrabApi,
    bot: &Bot,
    dialogue: &CrabDialogue,
    chat_id: ChatId,
    session: QuizSession,
) -> HandlerResult {
    let Some(outcome) = settle_classification(api, dialogue, session).await? else {
        return Ok(());
    };
    bot.send_message(chat_id, render::results(&outcome))
        .parse_mode(ParseMode::Html)
        .reply_markup(results_keyboard())
        .await?;
    Ok(())
}

/// A classification is in flight, or was lost when the bot stopped.
async fn awaiting_result(
    api: Arc<CrabApi>,
    bot: Bot,
    dialogue: CrabDialogue,
    mut session: QuizSession,
    msg: Message,
) -> HandlerResult {
    match msg.text() {
        Some(RESTART_QUIZ) => start_quiz(&bot, &dialogue, &msg).await,
        Some(BACK_HOME) => show_home(&bot, &dialogue, &msg).await,
        _ => {
            // Whatever the earlier request returns is dropped
            session.renew_token();
            finish_quiz(api, &bot, &dialogue, &msg, session).await
        }
    }
}

async fn results(
    api: Arc<CrabApi>,
    bot: Bot,
    dialogue: CrabDialogue,
    outcome: QuizOutcome,
    msg: Message,
) -> HandlerResult {
    match msg.text() {
        Some(RESTART_QUIZ) => start_quiz(&bot, &dialogue, &msg).await,
        Some(SAVE_RESULT) => {
            let mut catalog = Catalog::default();
            load_catalog(&api, &bot, &msg, &mut catalog).await?;
            let species = if outcome.is_identified() {
                outcome.species.as_str()
            } else {
                ""
            };
            let draft = SpecimenDraft::from_identification(outcome.vector.clone(), species);
            start_form(&bot, &dialogue, &msg, catalog, draft).await
        }
        Some(BACK_HOME) => show_home(&bot, &dialogue, &msg).await,
        _ => {
            bot.send_message(msg.chat.id, "Por favor, elige una de las opciones")
                .reply_markup(results_keyboard())
                .await?;
            Ok(())
        }
    }
}

/// Refreshes `catalog` in place. A failed fetch is logged and reported, and
/// the catalog keeps whatever it held.
async fn load_catalog(
    api: &CrabApi,
    bot: &Bot,
    msg: &Message,
    catalog: &mut Catalog,
) -> HandlerResult {
    if let Err(e) = catalog.refresh(api).await {
        log::error!("Error loading catalog: {}", e);
        bot.send_message(
            msg.chat.id,
            "⚠️ No se pudo cargar el catálogo, se muestran los datos disponibles.",
        )
        .await?;
    }
    Ok(())
}

async fn show_species(
    bot: &Bot,
    dialogue: &CrabDialogue,
    msg: &Message,
    catalog: Catalog,
    term: Option<&str>,
) -> HandlerResult {
    for text in render::catalog_messages(&catalog, term) {
        bot.send_message(msg.chat.id, text)
            .parse_mode(ParseMode::Html)
            .reply_markup(species_keyboard())
            .await?;
    }
    dialogue.update(State::Species { catalog }).await?;
    Ok(())
}

async fn species(
    api: Arc<CrabApi>,
    bot: Bot,
    dialogue: CrabDialogue,
    mut catalog: Catalog,
    msg: Message,
) -> HandlerResult {
    match msg.text() {
        Some(ADD_SPECIES) => start_form(&bot, &dialogue, &msg, catalog, SpecimenDraft::new()).await,
        Some(DELETE_SPECIES) => {
            if catalog.is_empty() {
                bot.send_message(msg.chat.id, "El catálogo está vacío").await?;
                return Ok(());
            }
            let mut rows: Vec<Vec<KeyboardButton>> = catalog
                .entries()
                .iter()
                .map(|entry| vec![KeyboardButton::new(entry.id.clone())])
                .collect();
            rows.push(vec![KeyboardButton::new(CANCEL)]);
            bot.send_message(msg.chat.id, "¿Qué especie quieres eliminar?")
                .reply_markup(KeyboardMarkup::new(rows))
                .await?;
            dialogue.update(State::DeleteSpecies { catalog }).await?;
            Ok(())
        }
        Some(REFRESH) => {
            load_catalog(&api, &bot, &msg, &mut catalog).await?;
            show_species(&bot, &dialogue, &msg, catalog, None).await
        }
        Some(BACK_HOME) => show_home(&bot, &dialogue, &msg).await,
        // Anything else is a search term
        Some(term) => show_species(&bot, &dialogue, &msg, catalog, Some(term)).await,
        None => {
            bot.send_message(msg.chat.id, "Escribe un texto para buscar en el catálogo")
                .await?;
            Ok(())
        }
    }
}

async fn start_form(
    bot: &Bot,
    dialogue: &CrabDialogue,
    msg: &Message,
    catalog: Catalog,
    draft: SpecimenDraft,
) -> HandlerResult {
    bot.send_message(
        msg.chat.id,
        "➕ <b>Agregar nueva especie</b>\nEl nombre común y el científico son obligatorios.",
    )
    .parse_mode(ParseMode::Html)
    .await?;
    prompt_field(bot, msg, &draft).await?;
    dialogue.update(State::AddSpecies { catalog, draft }).await?;
    Ok(())
}

async fn prompt_field(bot: &Bot, msg: &Message, draft: &SpecimenDraft) -> HandlerResult {
    if let Some(field) = draft.field() {
        bot.send_message(msg.chat.id, render::form_prompt(draft, field))
            .parse_mode(ParseMode::Html)
            .reply_markup(keyboard(&[&[CANCEL]]))
            .await?;
    }
    Ok(())
}

async fn add_species(
    api: Arc<CrabApi>,
    bot: Bot,
    dialogue: CrabDialogue,
    (mut catalog, mut draft): (Catalog, SpecimenDraft),
    msg: Message,
) -> HandlerResult {
    let text = match msg.text() {
        Some(CANCEL) => return show_species(&bot, &dialogue, &msg, catalog, None).await,
        Some(text) => text,
        None => {
            bot.send_message(msg.chat.id, "Por favor, responde con texto").await?;
            return Ok(());
        }
    };

    match draft.fill(text) {
        Err(e) => {
            bot.send_message(msg.chat.id, format!("⚠️ {}", e)).await?;
            prompt_field(&bot, &msg, &draft).await
        }
        Ok(Some(_)) => {
            prompt_field(&bot, &msg, &draft).await?;
            dialogue.update(State::AddSpecies { catalog, draft }).await?;
            Ok(())
        }
        Ok(None) => {
            let specimen = draft.into_specimen();
            match catalog.add(&api, &specimen).await {
                Ok(()) => {
                    bot.send_message(msg.chat.id, render::saved(&specimen.nombre))
                        .parse_mode(ParseMode::Html)
                        .await?;
                }
                Err(e) => {
                    log::error!("Error saving specimen: {}", e);
                    bot.send_message(msg.chat.id, "⚠️ No se pudo guardar la especie")
                        .await?;
                }
            }
            show_species(&bot, &dialogue, &msg, catalog, None).await
        }
    }
}

async fn delete_species(
    bot: Bot,
    dialogue: CrabDialogue,
    catalog: Catalog,
    msg: Message,
) -> HandlerResult {
    let id = match msg.text() {
        Some(CANCEL) | None => return show_species(&bot, &dialogue, &msg, catalog, None).await,
        Some(id) => id.trim().to_string(),
    };

    let Some(entry) = catalog.get(&id) else {
        bot.send_message(msg.chat.id, "No hay ninguna especie con ese identificador")
            .await?;
        return Ok(());
    };

    bot.send_message(msg.chat.id, render::confirm_delete(entry))
        .parse_mode(ParseMode::Html)
        .reply_markup(keyboard(&[&[YES, NO]]))
        .await?;
    dialogue.update(State::ConfirmDelete { catalog, id }).await?;
    Ok(())
}

async fn confirm_delete(
    api: Arc<CrabApi>,
    bot: Bot,
    dialogue: CrabDialogue,
    (mut catalog, id): (Catalog, String),
    msg: Message,
) -> HandlerResult {
    if msg.text() == Some(YES) {
        match catalog.delete(&api, &id).await {
            Ok(_) => {
                bot.send_message(msg.chat.id, "🗑 Especie eliminada").await?;
            }
            Err(e) => {
                log::error!("Error deleting {}: {}", id, e);
                bot.send_message(msg.chat.id, "⚠️ No se pudo eliminar la especie")
                    .await?;
            }
        }
    }
    show_species(&bot, &dialogue, &msg, catalog, None).await
}
