use centimo_core::{ParsedTransaction, TransactionKind};
use serde::Deserialize;
use thiserror::Error;

/// One catalog entry: a category name, the direction it implies, and the
/// lowercase keywords that vote for it.
#[derive(Debug, Clone, Deserialize)]
pub struct KeywordRule {
    pub category: String,
    #[serde(default)]
    pub kind: Option<TransactionKind>,
    pub keywords: Vec<String>,
}

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to parse keyword catalog: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Keyword catalog has no rules")]
    Empty,
}

/// Ordered keyword table. Rule order is the tie-break: the first rule with
/// a hit wins, so broad keywords belong after the specific ones that
/// contain them (`gasolinera` before `gas`).
#[derive(Debug, Clone)]
pub struct KeywordCatalog {
    rules: Vec<KeywordRule>,
}

impl KeywordCatalog {
    pub fn new(rules: Vec<KeywordRule>) -> Self {
        let rules = rules
            .into_iter()
            .map(|mut rule| {
                rule.keywords = rule.keywords.iter().map(|k| k.to_lowercase()).collect();
                rule
            })
            .collect();
        KeywordCatalog { rules }
    }

    /// Load a replacement catalog from a TOML document with one `[[rule]]`
    /// table per entry:
    ///
    /// ```toml
    /// [[rule]]
    /// category = "Food & Dining"
    /// kind = "expense"
    /// keywords = ["mercadona", "restaurante"]
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, CatalogError> {
        #[derive(Deserialize)]
        struct CatalogDoc {
            #[serde(rename = "rule", default)]
            rules: Vec<KeywordRule>,
        }

        let doc: CatalogDoc = toml::from_str(content)?;
        if doc.rules.is_empty() {
            return Err(CatalogError::Empty);
        }
        Ok(KeywordCatalog::new(doc.rules))
    }

    /// Category names in table order, deduplicated. Stands in for the
    /// caller's category list when none is supplied.
    pub fn category_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for rule in &self.rules {
            if !names.iter().any(|n| n == &rule.category) {
                names.push(rule.category.clone());
            }
        }
        names
    }

    /// Categorize a batch against the caller's available category names.
    /// Pure transform: the input records are left untouched and new ones
    /// are returned. Never fails; a record nothing matches either falls to
    /// an "other" bucket or keeps `category` unset.
    pub fn apply(
        &self,
        batch: &[ParsedTransaction],
        available: &[String],
    ) -> Vec<ParsedTransaction> {
        batch
            .iter()
            .map(|tx| self.categorize(tx, available))
            .collect()
    }

    fn categorize(&self, tx: &ParsedTransaction, available: &[String]) -> ParsedTransaction {
        if tx.category.is_some() {
            return tx.clone();
        }

        let haystack = tx.description.to_lowercase();
        let mut out = tx.clone();

        for rule in &self.rules {
            // A rule whose category the caller does not have is passed
            // over; later rules still get their chance.
            let Some(name) = resolve_name(available, &rule.category) else {
                continue;
            };
            if rule.keywords.iter().any(|k| haystack.contains(k.as_str())) {
                out.category = Some(name.to_string());
                if out.kind.is_none() {
                    out.kind = Some(rule.kind.unwrap_or(TransactionKind::Expense));
                }
                return out;
            }
        }

        let kind = *out.kind.get_or_insert(TransactionKind::Expense);
        out.category = other_bucket(available, kind).map(str::to_string);
        out
    }
}

impl Default for KeywordCatalog {
    fn default() -> Self {
        KeywordCatalog::new(builtin_rules())
    }
}

/// The caller's spelling is the one that goes on the record.
fn resolve_name<'a>(available: &'a [String], category: &str) -> Option<&'a str> {
    let target = category.to_lowercase();
    available
        .iter()
        .find(|name| name.to_lowercase() == target)
        .map(String::as_str)
}

/// First available name containing "other"; income records prefer a
/// bucket that also names income.
fn other_bucket(available: &[String], kind: TransactionKind) -> Option<&str> {
    let others: Vec<&String> = available
        .iter()
        .filter(|name| name.to_lowercase().contains("other"))
        .collect();

    if kind == TransactionKind::Income {
        let income_bucket = others.iter().find(|name| {
            let lower = name.to_lowercase();
            lower.contains("income") || lower.contains("ingreso")
        });
        if let Some(name) = income_bucket {
            return Some(name.as_str());
        }
    }
    others.first().map(|name| name.as_str())
}

fn builtin_rules() -> Vec<KeywordRule> {
    fn rule(category: &str, kind: TransactionKind, keywords: &[&str]) -> KeywordRule {
        KeywordRule {
            category: category.to_string(),
            kind: Some(kind),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    vec![
        rule(
            "Food & Dining",
            TransactionKind::Expense,
            &[
                "supermercado",
                "mercadona",
                "carrefour",
                "lidl",
                "aldi",
                "restaurante",
                "cafeteria",
                "panaderia",
                "glovo",
                "uber eats",
                "mcdonald",
                "kebab",
                "pizzeria",
            ],
        ),
        rule(
            "Transport",
            TransactionKind::Expense,
            &[
                "gasolinera",
                "repsol",
                "cepsa",
                "metro",
                "renfe",
                "taxi",
                "uber",
                "cabify",
                "parking",
                "autopista",
                "gasolina",
            ],
        ),
        rule(
            "Shopping",
            TransactionKind::Expense,
            &[
                "amazon",
                "zara",
                "el corte ingles",
                "decathlon",
                "ikea",
                "fnac",
                "aliexpress",
                "zalando",
            ],
        ),
        rule(
            "Bills & Utilities",
            TransactionKind::Expense,
            &[
                "factura",
                "recibo",
                "luz",
                "agua",
                "gas",
                "internet",
                "telefono",
                "teléfono",
                "movistar",
                "vodafone",
                "orange",
                "endesa",
                "iberdrola",
                "naturgy",
                "seguro",
            ],
        ),
        rule(
            "Entertainment",
            TransactionKind::Expense,
            &[
                "netflix",
                "spotify",
                "hbo",
                "disney",
                "cine",
                "teatro",
                "concierto",
                "steam",
                "playstation",
                "xbox",
            ],
        ),
        rule(
            "Healthcare",
            TransactionKind::Expense,
            &[
                "farmacia",
                "clinica",
                "clínica",
                "hospital",
                "dentista",
                "medico",
                "médico",
                "optica",
            ],
        ),
        rule(
            "Education",
            TransactionKind::Expense,
            &[
                "universidad",
                "colegio",
                "academia",
                "curso",
                "matricula",
                "matrícula",
                "udemy",
                "coursera",
            ],
        ),
        rule(
            "Salary",
            TransactionKind::Income,
            &["nomina", "nómina", "salario", "sueldo", "payroll"],
        ),
        rule(
            "Freelance",
            TransactionKind::Income,
            &["honorarios", "freelance", "autonomo", "autónomo"],
        ),
        rule(
            "Investments",
            TransactionKind::Income,
            &[
                "dividendo",
                "intereses",
                "acciones",
                "fondo",
                "etf",
                "broker",
                "degiro",
                "crypto",
            ],
        ),
    ]
}

// ── Tests ─────────────────────────────────────────────────────────────────────
