//! Prompt builders for the generation service
//!
//! Prompts are Portuguese (pt-BR), matching the app's audience and the
//! localized enum values the schemas ask for.

use crate::models::{Goal, UserProfile};

/// Persona shared by every recipe prompt
pub const CHEF_PERSONA: &str = r#"Você é o FitSwap, um chef nutricionista especializado em transformar pratos em versões mais saudáveis sem perder o sabor.

REGRAS:
1. Responda APENAS com JSON válido no formato solicitado
2. Use medidas caseiras brasileiras (xícara, colher de sopa, gramas)
3. Macros por porção, em números (kcal e gramas)
4. Cada ingrediente deve ter um emoji no campo "icon"
5. "substitutions" lista cada troca saudável com o motivo nutricional
6. "healthTips" explica em 1-2 frases o benefício principal do prato"#;

/// Style suffix appended to every image prompt
pub const IMAGE_STYLE_SUFFIX: &str = "professional food photography, soft studio lighting, \
subtle lime green (#84cc16) accent in the background, elegant minimalist plating, \
top-down 45 degree angle, high detail, appetizing";

pub const PANTRY_SCAN_PROMPT: &str = r#"Identifique todos os ingredientes alimentícios visíveis nesta foto de despensa ou geladeira.

REGRAS:
1. Liste apenas alimentos (ignore embalagens vazias, utensílios e objetos)
2. Use nomes genéricos em português (ex.: "Ovos", "Tomate", "Peito de frango")
3. Não repita ingredientes

Responda em JSON: {"ingredients": ["..."]}"#;

/// Strategy phrase for each goal
pub fn goal_strategy(goal: Goal) -> &'static str {
    match goal {
        Goal::LoseWeight => {
            "Priorize déficit calórico: reduza gorduras e açúcares, aumente fibras e proteínas magras para maior saciedade."
        }
        Goal::GainMuscle => {
            "Priorize proteínas de alto valor biológico e carboidratos complexos para ganho de massa muscular."
        }
        Goal::Maintain => {
            "Mantenha o equilíbrio entre macronutrientes, com porções moderadas e ingredientes integrais."
        }
        Goal::EatHealthy => {
            "Priorize alimentos in natura, ricos em micronutrientes e antioxidantes, evitando ultraprocessados."
        }
    }
}

fn preferences_block(restrictions: &[String], dislikes: &[String]) -> String {
    let mut block = String::new();
    if !restrictions.is_empty() {
        block.push_str(&format!(
            "\nRESTRIÇÕES ALIMENTARES (obrigatório respeitar): {}",
            restrictions.join(", ")
        ));
    }
    if !dislikes.is_empty() {
        block.push_str(&format!("\nNÃO USAR (o usuário não gosta): {}", dislikes.join(", ")));
    }
    block
}

/// Transform a named dish into a healthier version
pub fn build_dish_prompt(
    dish_name: &str,
    goal: Goal,
    restrictions: &[String],
    dislikes: &[String],
) -> String {
    format!(
        r#"{}

TAREFA: Crie uma versão FIT do prato "{}".
Mantenha a essência e o sabor do prato original, trocando ingredientes calóricos por alternativas saudáveis.
Preencha "originalName" com o nome do prato original.

OBJETIVO: {}{}"#,
        CHEF_PERSONA,
        dish_name.trim(),
        goal_strategy(goal),
        preferences_block(restrictions, dislikes)
    )
}

/// Cook with what the user already has
pub fn build_pantry_prompt(
    ingredients: &[String],
    goal: Goal,
    restrictions: &[String],
    dislikes: &[String],
) -> String {
    format!(
        r#"{}

TAREFA: Crie uma receita saudável usando PRINCIPALMENTE estes ingredientes disponíveis:
{}
Você pode assumir itens básicos (sal, pimenta, azeite, alho, cebola). Evite exigir compras extras.

OBJETIVO: {}{}"#,
        CHEF_PERSONA,
        ingredients
            .iter()
            .map(|i| format!("- {}", i.trim()))
            .collect::<Vec<_>>()
            .join("\n"),
        goal_strategy(goal),
        preferences_block(restrictions, dislikes)
    )
}

/// Seven-day plan with `meals_per_day` meals each
pub fn build_weekly_plan_prompt(
    profile: &UserProfile,
    preference: &str,
    meals_per_day: usize,
    slot_labels: &[&str],
    allow_repeats: bool,
) -> String {
    let repetition = if allow_repeats {
        "Pode repetir receitas ao longo da semana para facilitar o preparo em lote (marmitas)."
    } else {
        "Maximize a variedade: NÃO repita receitas ao longo da semana."
    };
    let preference = if preference.trim().is_empty() {
        "sem preferência específica"
    } else {
        preference.trim()
    };

    format!(
        r#"{}

TAREFA: Monte um cardápio semanal de 7 dias (Segunda a Domingo) com exatamente {} refeições por dia, nesta ordem: {}.
Meta diária aproximada: {} kcal.
Preferência do usuário: {}.
{}

OBJETIVO: {}{}"#,
        CHEF_PERSONA,
        meals_per_day,
        slot_labels.join(", "),
        profile.daily_calorie_target(),
        preference,
        repetition,
        goal_strategy(profile.goal),
        preferences_block(&profile.restrictions, &profile.dislikes)
    )
}

/// Consolidate flattened plan ingredients into a shopping list
pub fn build_shopping_prompt(flattened_ingredients: &str) -> String {
    format!(
        r#"Você é um assistente de compras de supermercado.

A partir desta lista de ingredientes de um cardápio semanal (separados por ";"), gere uma lista de compras:
{}

REGRAS:
1. Some e consolide itens repetidos (um item por nome)
2. Converta quantidades para unidades de compra (ex.: "3 colheres de aveia" -> "1 pacote de aveia 500g")
3. Classifique cada item em: Hortifruti, Proteínas, Laticínios, Mercearia ou Outros"#,
        flattened_ingredients
    )
}

/// Image prompt for a recipe name
pub fn build_image_prompt(recipe_name: &str) -> String {
    format!("{}, {}", recipe_name.trim(), IMAGE_STYLE_SUFFIX)
}
