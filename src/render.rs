//! Message texts, formatted for Telegram's HTML parse mode.

use teloxide::utils::html::escape;

use crate::catalog::{Catalog, CatalogEntry, FormField, SpecimenDraft};
use crate::quiz::{QuizOutcome, Question};

/// Telegram rejects longer messages.
const MESSAGE_LIMIT: usize = 4096;

// Per-field budgets for a catalog card, in characters of escaped text. Their
// sum plus the card's fixed text stays under `MESSAGE_LIMIT`.
const NAME_LIMIT: usize = 200;
const DESCRIPTION_LIMIT: usize = 2000;
const DETAIL_LIMIT: usize = 300;
const LINK_LIMIT: usize = 500;

pub const HOME_TEXT: &str = "🦀 <b>Identificador de porcelánidos</b>\n\n\
Responde 8 preguntas sobre la morfología del ejemplar (caparazón, antenas, \
quelípedos…) y te diremos qué especie de cangrejo porcelana es.\n\n\
También puedes consultar y editar el catálogo de especies.";

pub fn question(number: usize, total: usize, question: &Question) -> String {
    format!(
        "Pregunta {} de {}\n\n<b>{}</b>\n\n1️⃣ {}\n2️⃣ {}",
        number,
        total,
        escape(question.text),
        escape(question.options[0]),
        escape(question.options[1]),
    )
}

pub fn results(outcome: &QuizOutcome) -> String {
    let mut text = if outcome.is_identified() {
        format!(
            "🔎 Especie identificada: <b><i>{}</i></b>\n",
            clip(&outcome.species.replace('_', " "), NAME_LIMIT)
        )
    } else {
        "🔎 No se pudo identificar la especie.\n".to_string()
    };
    text.push_str(&format!(
        "Coincidencias con la clave de referencia: {} de {}\n",
        outcome.score,
        outcome.total()
    ));

    for (i, (question, answer)) in outcome.review().enumerate() {
        let mark = if question.is_correct(answer) { "✅" } else { "❌" };
        text.push_str(&format!(
            "\n{} {}. {}\nTu respuesta: {}",
            mark,
            i + 1,
            escape(question.text),
            escape(question.option_for(answer)),
        ));
        if !question.is_correct(answer) {
            text.push_str(&format!(
                "\nReferencia: {}",
                escape(question.option_for(question.correct_answer))
            ));
        }
        text.push_str(&format!("\n<i>{}</i>\n", escape(question.explanation)));
    }
    text
}

pub fn count_label(count: usize) -> String {
    if count == 1 {
        "1 especie registrada".to_string()
    } else {
        format!("{} especies registradas", count)
    }
}

/// Escapes `text` for HTML, cut to at most `limit` characters of escaped
/// output. Cut text ends in an ellipsis.
fn clip(text: &str, limit: usize) -> String {
    let escaped = escape(text);
    if escaped.chars().count() <= limit {
        return escaped;
    }

    let mut clipped = String::new();
    let mut used = 0;
    let mut buf = [0; 4];
    for c in text.chars() {
        let piece = escape(c.encode_utf8(&mut buf));
        let width = piece.chars().count();
        if used + width + 1 > limit {
            break;
        }
        clipped.push_str(&piece);
        used += width;
    }
    clipped.push('…');
    clipped
}

pub fn entry_card(entry: &CatalogEntry) -> String {
    let mut card = format!(
        "<b>{}</b>\n<i>{}</i>\n",
        clip(&entry.nombre, NAME_LIMIT),
        clip(&entry.nombre_cientifico, NAME_LIMIT)
    );
    if !entry.descripcion.is_empty() {
        card.push_str(&format!("{}\n", clip(&entry.descripcion, DESCRIPTION_LIMIT)));
    }
    card.push_str(&format!(
        "📍 {}\n📏 {}\n",
        clip(&entry.habitat, DETAIL_LIMIT),
        clip(&entry.tamano, DETAIL_LIMIT)
    ));
    // A clipped URL is useless, so long ones are left out
    if let Some(image) = entry
        .imagen
        .as_deref()
        .filter(|image| image.starts_with("http://") || image.starts_with("https://"))
        .map(escape)
        .filter(|image| image.chars().count() <= LINK_LIMIT)
    {
        card.push_str(&format!("<a href=\"{}\">🖼 Imagen</a>\n", image));
    }
    card.push_str(&format!(
        "🗓 Agregado: {}\n🆔 <code>{}</code>",
        entry.fecha_agregada.format("%d/%m/%Y"),
        clip(&entry.id, NAME_LIMIT)
    ));
    card
}

/// The catalog screen, split into as many messages as needed. A search term
/// narrows the list to matching entries.
pub fn catalog_messages(catalog: &Catalog, term: Option<&str>) -> Vec<String> {
    let term = term.map(str::trim).filter(|term| !term.is_empty());
    let shown = catalog.search(term.unwrap_or_default());

    let mut header = format!("📚 <b>Catálogo de especies</b>\n{}", count_label(catalog.len()));
    if shown.is_empty() {
        match term {
            Some(term) => header.push_str(&format!(
                "\n\nNo se encontraron coincidencias para «{}».",
                clip(term, NAME_LIMIT)
            )),
            None => header.push_str(
                "\n\nEl catálogo está vacío. Empieza registrando una especie con «Agregar especie».",
            ),
        }
        return vec![header];
    }
    if term.is_some() {
        header.push_str(&format!(
            "\nMostrando {} de {} registros encontrados",
            shown.len(),
            catalog.len()
        ));
    }

    let mut messages = Vec::new();
    let mut current = header;
    for card in shown.into_iter().map(entry_card) {
        if current.chars().count() + card.chars().count() + 2 <= MESSAGE_LIMIT {
            current.push_str("\n\n");
            current.push_str(&card);
        } else {
            messages.push(std::mem::replace(&mut current, card));
        }
    }
    messages.push(current);
    messages
}

pub fn form_prompt(draft: &SpecimenDraft, field: FormField) -> String {
    let mut prompt = format!("✏️ {}", escape(field.prompt()));
    let current = draft.value(field);
    if !current.is_empty() {
        prompt.push_str(&format!("\nValor actual: <i>{}</i>", clip(current, DESCRIPTION_LIMIT)));
    }
    if !field.is_required() || !current.is_empty() {
        prompt.push_str("\n(envía «-» para dejarlo así)");
    }
    prompt
}

pub fn saved(entry_name: &str) -> String {
    format!("✅ Especie «{}» guardada", clip(entry_name, NAME_LIMIT))
}

pub fn confirm_delete(entry: &CatalogEntry) -> String {
    format!(
        "¿Estás seguro de eliminar «{}» (<code>{}</code>)?",
        clip(&entry.nombre, NAME_LIMIT),
        clip(&entry.id, NAME_LIMIT)
    )
}
