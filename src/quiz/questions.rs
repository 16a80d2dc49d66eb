use super::Question;

macro_rules! image {
    ($file:literal) => {
        concat!("src/assets/preguntas_imagenes/", $file)
    };
}

/// The identification key, in the order the classifier expects.
pub static QUESTIONS: [Question; 8] = [
    Question {
        text: "¿Tiene el caparazón liso o rugoso?",
        options: ["Liso/Casi liso", "Rugoso"],
        correct_answer: false,
        images: [image!("caparazon_liso.jpg"), image!("caparazon_rugoso.jpg")],
        explanation: "Los porcelánidos tienen 10 patas, pero el último par está oculto bajo el caparazón.",
    },
    Question {
        text: "¿Su antena es desarmada (lisa) o tiene una parte aserrada/tuberculada?",
        options: ["Desarmada/Lisa", "Contiene surcos"],
        correct_answer: true,
        images: [image!("antena_lisa.jpg"), image!("aserrada.png")],
        explanation: "Los porcelánidos tienen el abdomen reducido y plegado.",
    },
    Question {
        text: "¿Sus maxilípedos son lisos/casi lisos o contienen surcos?",
        options: ["Liso/Casi liso", "Con surcos"],
        correct_answer: true,
        images: [
            image!("maxilipedos_lisos.jpeg"),
            image!("maxilipedos_tuberculados.jpeg"),
        ],
        explanation: "Los porcelánidos tienen antenas largas.",
    },
    Question {
        text: "¿Tiene quelípedos desiguales o iguales/subiguales?",
        options: ["Desiguales", "Iguales/Subiguales"],
        correct_answer: false,
        images: [image!("pinzas_desiguales.jpg"), image!("pinzas_iguales.png")],
        explanation: "Los porcelánidos son anomuros.",
    },
    Question {
        text: "¿Su caparazón es cuadrado/subcuadrado o rectangular?",
        options: ["Cuadrado/Subcuadrado", "Rectangular"],
        correct_answer: true,
        images: [
            image!("caparazon_cuadrado.jpg"),
            image!("caparazon_rectangular.jpg"),
        ],
        explanation: "Tienen un caparazón característico de forma redondeada u ovalada.",
    },
    Question {
        text: "¿Cuántos telsones tiene?",
        options: ["7 Telsones", "5 Telsones"],
        correct_answer: true,
        images: [image!("telson_7.jpeg"), image!("telson_5.jpeg")],
        explanation: "Importante para distinguir géneros.",
    },
    Question {
        text: "¿Los machos presentan pleópodos?",
        options: ["No", "Sí"],
        correct_answer: false,
        images: [image!("no_pleopodo.jpg"), image!("si_pleopodos.png")],
        explanation: "Característica dimórfica.",
    },
    Question {
        text: "¿Cómo es su hábitat?",
        options: ["Hábitats protegidos", "Hábitats duros"],
        correct_answer: false,
        images: [image!("habitat_protegido.jpg"), image!("habitat_duro.jpg")],
        explanation: "Viven bajo rocas o en arrecifes.",
    },
];
