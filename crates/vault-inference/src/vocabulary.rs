//! Fixed term tables used by the scorers and detectors.
//!
//! All terms are lowercase; matching lowercases the input first.

use vault_core::{DocumentCategory, DocumentKind};

/// Keyword list per category, consulted by the keyword scorer.
pub fn category_keywords(category: DocumentCategory) -> &'static [&'static str] {
    match category {
        DocumentCategory::Financial => &[
            "account",
            "balance",
            "statement",
            "bank",
            "invoice",
            "payment",
            "transaction",
            "deposit",
            "credit",
            "loan",
        ],
        DocumentCategory::Legal => &[
            "contract",
            "agreement",
            "court",
            "attorney",
            "lawsuit",
            "plaintiff",
            "defendant",
            "clause",
            "jurisdiction",
            "notary",
        ],
        DocumentCategory::Medical => &[
            "medical",
            "patient",
            "diagnosis",
            "prescription",
            "doctor",
            "hospital",
            "clinic",
            "treatment",
            "physician",
            "pharmacy",
        ],
        DocumentCategory::Insurance => &[
            "insurance",
            "policy",
            "premium",
            "claim",
            "coverage",
            "deductible",
            "insured",
            "beneficiary",
            "underwriter",
        ],
        DocumentCategory::Tax => &[
            "tax",
            "internal revenue",
            "w-2",
            "1099",
            "deduction",
            "refund",
            "withholding",
            "fiscal year",
        ],
        DocumentCategory::Employment => &[
            "employment",
            "employer",
            "employee",
            "salary",
            "payroll",
            "resume",
            "offer letter",
            "hiring",
            "paystub",
        ],
        DocumentCategory::Education => &[
            "school",
            "university",
            "transcript",
            "diploma",
            "degree",
            "student",
            "course",
            "tuition",
            "enrollment",
        ],
        DocumentCategory::Identity => &[
            "passport",
            "driver license",
            "identity",
            "birth certificate",
            "social security",
            "national id",
            "citizenship",
            "visa",
        ],
        DocumentCategory::Property => &[
            "property",
            "mortgage",
            "deed",
            "lease",
            "tenant",
            "landlord",
            "appraisal",
            "real estate",
            "homeowner",
        ],
        DocumentCategory::Correspondence => &[
            "dear",
            "sincerely",
            "regards",
            "letter",
            "memo",
            "correspondence",
            "to whom it may concern",
        ],
        DocumentCategory::Other => &[],
    }
}

/// Feature terms per category, consulted by the heuristic feature scorer.
///
/// Overlaps with [`category_keywords`] on purpose: the two scorers are meant
/// to agree on clear-cut documents.
pub fn category_features(category: DocumentCategory) -> &'static [&'static str] {
    match category {
        DocumentCategory::Financial => &[
            "account",
            "account number",
            "routing",
            "balance",
            "statement",
            "bank",
            "transaction",
            "interest rate",
            "amount due",
        ],
        DocumentCategory::Legal => &[
            "hereby",
            "whereas",
            "party",
            "agreement",
            "governing law",
            "signature",
            "witness",
            "terms and conditions",
        ],
        DocumentCategory::Medical => &[
            "patient",
            "diagnosis",
            "dosage",
            "symptoms",
            "blood pressure",
            "prescribed",
            "lab results",
        ],
        DocumentCategory::Insurance => &[
            "policy number",
            "premium",
            "coverage",
            "claim number",
            "deductible",
            "policyholder",
            "effective date",
        ],
        DocumentCategory::Tax => &[
            "tax year",
            "taxable income",
            "adjusted gross",
            "withholding",
            "filing status",
            "refund",
            "tax return",
        ],
        DocumentCategory::Employment => &[
            "employee id",
            "gross pay",
            "net pay",
            "pay period",
            "start date",
            "job title",
            "salary",
        ],
        DocumentCategory::Education => &[
            "gpa",
            "semester",
            "credits",
            "grade",
            "course",
            "student id",
            "academic",
        ],
        DocumentCategory::Identity => &[
            "date of birth",
            "place of birth",
            "nationality",
            "expiry date",
            "passport no",
            "issued",
        ],
        DocumentCategory::Property => &[
            "parcel",
            "square feet",
            "lot size",
            "escrow",
            "title",
            "closing",
            "mortgage",
        ],
        DocumentCategory::Correspondence => &[
            "dear",
            "sincerely",
            "yours",
            "regards",
            "re:",
            "cc:",
        ],
        DocumentCategory::Other => &[],
    }
}

/// Ordered document kind table; the first kind with a matching term wins.
pub const KIND_TERMS: &[(DocumentKind, &[&str])] = &[
    (DocumentKind::Invoice, &["invoice", "bill to", "amount due"]),
    (DocumentKind::Receipt, &["receipt", "amount paid", "thank you for your purchase"]),
    (DocumentKind::Contract, &["contract", "agreement", "hereby agree"]),
    (DocumentKind::Statement, &["statement", "opening balance", "closing balance"]),
    (DocumentKind::Report, &["report", "findings", "summary of results"]),
    (DocumentKind::Letter, &["dear ", "sincerely", "yours truly"]),
    (DocumentKind::Form, &["form", "please complete", "fill in"]),
    (DocumentKind::Certificate, &["certificate", "certify", "certified"]),
    (DocumentKind::Prescription, &["prescription", "refills", "dispense"]),
    (DocumentKind::Policy, &["policy", "terms of coverage"]),
];

/// Supported languages and their marker words.
pub const LANGUAGE_MARKERS: &[(&str, &[&str])] = &[
    ("en", &["the", "and", "of", "to", "is", "with", "for", "this", "that"]),
    ("es", &["el", "los", "las", "que", "y", "por", "con", "para", "una", "es"]),
    ("fr", &["le", "les", "et", "des", "est", "pour", "avec", "une", "dans"]),
    ("de", &["der", "die", "das", "und", "ist", "nicht", "mit", "ein", "eine", "für"]),
    ("it", &["il", "di", "che", "è", "per", "gli", "della", "sono", "non"]),
    ("pt", &["o", "os", "não", "uma", "com", "são", "do", "da", "em"]),
];

/// Words never reported as document keywords.
pub const STOP_WORDS: &[&str] = &[
    "about", "above", "after", "again", "also", "been", "before", "being", "below", "between",
    "both", "could", "does", "doing", "down", "during", "each", "from", "further", "have",
    "having", "here", "into", "just", "more", "most", "only", "other", "over", "same", "should",
    "some", "such", "than", "that", "their", "them", "then", "there", "these", "they", "this",
    "those", "through", "under", "until", "very", "were", "what", "when", "where", "which",
    "while", "will", "with", "would", "your", "yours", "please", "dear",
];
