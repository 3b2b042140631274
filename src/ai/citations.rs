//! Health-topic references attached to generated recipes
//!
//! Topics are matched by keyword (pt-BR and English) against the recipe's
//! health tips. A recipe with no matching topic gets the general disclaimer.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Citation {
    pub id: &'static str,
    pub title: &'static str,
    pub url: &'static str,
}

/// Shown when no specific topic applies
pub const GENERAL_DISCLAIMER_ID: &str = "general-disclaimer";

struct Topic {
    pattern: &'static str,
    citation: Citation,
}

const TOPICS: &[Topic] = &[
    Topic {
        pattern: r"prote[ií]na|protein",
        citation: Citation {
            id: "protein-intake",
            title: "Dietary protein and muscle mass (Nutrients, 2021)",
            url: "https://pubmed.ncbi.nlm.nih.gov/33925520/",
        },
    },
    Topic {
        pattern: r"[oô]mega[- ]?3|omega",
        citation: Citation {
            id: "omega-3",
            title: "Omega-3 fatty acids (NIH Office of Dietary Supplements)",
            url: "https://ods.od.nih.gov/factsheets/Omega3FattyAcids-HealthProfessional/",
        },
    },
    Topic {
        pattern: r"fibras?|fiber|fibre",
        citation: Citation {
            id: "dietary-fiber",
            title: "Dietary fibre and health outcomes (The Lancet, 2019)",
            url: "https://pubmed.ncbi.nlm.nih.gov/30638909/",
        },
    },
    Topic {
        pattern: r"carboidratos?|carb(s|ohydrates?)?\b|[ií]ndice glic[eê]mico|glycemic",
        citation: Citation {
            id: "carbohydrates",
            title: "Carbohydrate quality and health (WHO guideline, 2023)",
            url: "https://www.who.int/publications/i/item/9789240073593",
        },
    },
    Topic {
        pattern: r"calorias?|calori(es|c)|d[eé]ficit cal[oó]rico",
        citation: Citation {
            id: "energy-balance",
            title: "Energy balance and obesity (Circulation, 2012)",
            url: "https://pubmed.ncbi.nlm.nih.gov/22753534/",
        },
    },
    Topic {
        pattern: r"metabolismo|metabolism",
        citation: Citation {
            id: "metabolism",
            title: "Thermic effect of food (Nutrition & Metabolism, 2004)",
            url: "https://pubmed.ncbi.nlm.nih.gov/15507147/",
        },
    },
    Topic {
        pattern: r"antioxidantes?|antioxidants?",
        citation: Citation {
            id: "antioxidants",
            title: "Antioxidants: in depth (NCCIH)",
            url: "https://www.nccih.nih.gov/health/antioxidants-in-depth",
        },
    },
    Topic {
        pattern: r"hidrata[cç][aã]o|hydrat",
        citation: Citation {
            id: "hydration",
            title: "Water, hydration and health (Nutrition Reviews, 2010)",
            url: "https://pubmed.ncbi.nlm.nih.gov/20646222/",
        },
    },
    Topic {
        pattern: r"s[oó]dio|sodium|\bsal\b",
        citation: Citation {
            id: "sodium",
            title: "Sodium reduction (World Health Organization)",
            url: "https://www.who.int/news-room/fact-sheets/detail/salt-reduction",
        },
    },
    Topic {
        pattern: r"a[cç][uú]car|sugar",
        citation: Citation {
            id: "free-sugars",
            title: "Guideline: sugars intake for adults and children (WHO, 2015)",
            url: "https://www.who.int/publications/i/item/9789241549028",
        },
    },
];

const GENERAL_DISCLAIMER: Citation = Citation {
    id: GENERAL_DISCLAIMER_ID,
    title: "Guia Alimentar para a População Brasileira (Ministério da Saúde)",
    url: "https://bvsms.saude.gov.br/bvs/publicacoes/guia_alimentar_populacao_brasileira_2ed.pdf",
};

static MATCHERS: Lazy<Vec<(Regex, &'static Citation)>> = Lazy::new(|| {
    TOPICS
        .iter()
        .filter_map(|topic| {
            match Regex::new(&format!("(?i){}", topic.pattern)) {
                Ok(re) => Some((re, &topic.citation)),
                Err(e) => {
                    tracing::warn!("[Citations] Invalid pattern for {}: {}", topic.citation.id, e);
                    None
                }
            }
        })
        .collect()
});

/// Reference ids for the topics mentioned in `health_tips`, in dictionary order
pub fn citations_for(health_tips: &str) -> Vec<String> {
    let ids: Vec<String> = MATCHERS
        .iter()
        .filter(|(re, _)| re.is_match(health_tips))
        .map(|(_, c)| c.id.to_string())
        .collect();

    if ids.is_empty() {
        vec![GENERAL_DISCLAIMER_ID.to_string()]
    } else {
        ids
    }
}

/// Title and link for a reference id
pub fn lookup(id: &str) -> Option<&'static Citation> {
    if id == GENERAL_DISCLAIMER_ID {
        return Some(&GENERAL_DISCLAIMER);
    }
    TOPICS.iter().map(|t| &t.citation).find(|c| c.id == id)
}
