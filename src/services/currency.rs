use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::tresorerie::Devise;

/// Fixed CFA franc parity: 655.957 XOF = 1 EUR
pub fn xof_per_eur() -> Decimal {
    Decimal::new(655_957, 3)
}

/// Countries whose members pay in XOF
pub fn is_senegal(pays: Option<&str>) -> bool {
    match pays.map(|p| p.trim().to_lowercase()) {
        Some(p) => matches!(p.as_str(), "senegal" | "sénégal" | "sn"),
        None => false,
    }
}

/// Currency a member from `pays` pays in when none is given
pub fn default_devise(pays: Option<&str>) -> Devise {
    if is_senegal(pays) {
        Devise::Xof
    } else {
        Devise::Eur
    }
}

/// Euro equivalent for reporting, rounded half away from zero to cents
pub fn to_eur(montant: Decimal, devise: Devise) -> Decimal {
    let eur = match devise {
        Devise::Eur => montant,
        Devise::Xof => montant / xof_per_eur(),
    };
    eur.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn converts_xof_at_fixed_parity() {
        assert_eq!(to_eur(dec("655957"), Devise::Xof), dec("1000.00"));
        assert_eq!(to_eur(dec("10000"), Devise::Xof), dec("15.24"));
        assert_eq!(to_eur(dec("25.005"), Devise::Eur), dec("25.01"));
    }

    #[test]
    fn senegal_defaults_to_xof() {
        assert_eq!(default_devise(Some("Sénégal")), Devise::Xof);
        assert_eq!(default_devise(Some(" senegal ")), Devise::Xof);
        assert_eq!(default_devise(Some("France")), Devise::Eur);
        assert_eq!(default_devise(None), Devise::Eur);
    }
}
