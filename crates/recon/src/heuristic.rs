use lekha_core::{AccountId, PartyId};

/// Confidence assigned to a keyword-table hit.
pub const KEYWORD_CONFIDENCE: u8 = 70;
/// Confidence assigned to a party-name hit.
pub const PARTY_CONFIDENCE: u8 = 75;

/// Shortest party name considered for substring matching. Anything shorter
/// produces too many accidental hits.
const MIN_PARTY_NAME_LEN: usize = 4;

/// Account lookup projection: the tenant's active chart rows.
#[derive(Debug, Clone)]
pub struct AccountRef {
    pub id: AccountId,
    pub name: String,
}

/// Party lookup projection: active parties with their default account.
#[derive(Debug, Clone)]
pub struct PartyRef {
    pub id: PartyId,
    pub name: String,
    pub default_account_id: Option<AccountId>,
}

/// Fixed keyword table, evaluated top to bottom; the first set with any
/// substring hit wins. The right-hand side is an account-name hint resolved
/// against the tenant's chart; an unresolvable hint falls through.
const KEYWORD_PATTERNS: &[(&[&str], &str)] = &[
    (&["bank chg", "bank charges", "sms chg", "amb chg", "chrg", "consolidated charges"], "Bank Charges"),
    (&["int cr", "interest credit", "interest"], "Interest Income"),
    (&["salary", "sal cr", "payroll"], "Salaries"),
    // Generic transfer rails with no better signal default to sales receipts.
    (&["upi", "imps", "neft"], "Sales"),
    (&["amazon", "flipkart", "myntra", "meesho"], "Purchases"),
    (&["electricity", "power bill", "bescom", "broadband", "airtel", "jio", "water bill"], "Utilities"),
    (&["rent"], "Rent"),
    (&["lic premium", "insurance", "policy"], "Insurance"),
    (&["cgst", "sgst", "igst", "gst"], "GST Payable"),
    (&["tds"], "TDS Payable"),
];

#[derive(Debug, Clone, PartialEq)]
pub struct HeuristicHit {
    pub account_id: AccountId,
    pub party_id: Option<PartyId>,
    pub confidence: u8,
}

fn find_account_by_hint(accounts: &[AccountRef], hint: &str) -> Option<AccountId> {
    let hint = hint.to_lowercase();
    accounts
        .iter()
        .find(|a| a.name.to_lowercase().contains(&hint))
        .map(|a| a.id)
}

/// Keyword-table then party-name categorization. Deterministic: same
/// description and lookup data always produce the same hit.
pub fn heuristic_categorize(
    description: &str,
    accounts: &[AccountRef],
    parties: &[PartyRef],
) -> Option<HeuristicHit> {
    let haystack = description.to_lowercase();

    for (keywords, account_hint) in KEYWORD_PATTERNS {
        if keywords.iter().any(|kw| haystack.contains(kw)) {
            if let Some(account_id) = find_account_by_hint(accounts, account_hint) {
                return Some(HeuristicHit {
                    account_id,
                    party_id: None,
                    confidence: KEYWORD_CONFIDENCE,
                });
            }
            // Hint names an account this tenant does not have; keep looking.
        }
    }

    for party in parties {
        if party.name.len() < MIN_PARTY_NAME_LEN {
            continue;
        }
        if haystack.contains(&party.name.to_lowercase()) {
            if let Some(account_id) = party.default_account_id {
                return Some(HeuristicHit {
                    account_id,
                    party_id: Some(party.id),
                    confidence: PARTY_CONFIDENCE,
                });
            }
        }
    }

    None
}
