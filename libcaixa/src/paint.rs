use std::fmt;

/// Background color as `0xRRGGBB`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color(u32);

impl Color {
    pub const WHITE: Color = Color(0xffffff);
    pub const NEGATIVE: Color = Color(0xb7e1cd);
    pub const AWAITING_CONFIRMATION: Color = Color(0xff60ff);
    pub const PAID_BY_CHECK: Color = Color(0x00ffff);
    pub const BALANCE: Color = Color(0x9900ff);
    pub const CREDIT_CARD_PENDING: Color = Color(0x46bdc6);
    pub const SCHEDULED: Color = Color(0x6d9eeb);
    pub const PAID_OUTFLOW: Color = Color(0x43f643);
    pub const PAID_INFLOW: Color = Color(0xdd7e6b);

    pub const fn rgb(rgb: u32) -> Self {
        Color(rgb & 0xffffff)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06x}", self.0)
    }
}

pub const AWAITING_CONFIRMATION: &str = "À pagar - CONFIRMAR VALOR !!";
pub const PAID_BY_CHECK: &str = "Pago - CHEQUE !!";
pub const BALANCE: &str = "SALDO";
pub const CREDIT_CARD_PENDING: &str = "À pagar - CARTÃO DE CRÉDITO";
pub const SCHEDULED: &str = "Agendado";
pub const PAID: &str = "Pago";

/// Payment status categories recognized in the status column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    AwaitingConfirmation,
    PaidByCheck,
    Balance,
    CreditCardPending,
    Scheduled,
    Paid,
    Other,
}

impl Status {
    /// First matching rule wins; exact markers are checked before substrings.
    pub fn classify(status: &str) -> Status {
        match status {
            AWAITING_CONFIRMATION => Status::AwaitingConfirmation,
            PAID_BY_CHECK => Status::PaidByCheck,
            BALANCE => Status::Balance,
            s if s.contains(CREDIT_CARD_PENDING) => Status::CreditCardPending,
            s if s.contains(SCHEDULED) => Status::Scheduled,
            PAID => Status::Paid,
            _ => Status::Other,
        }
    }
}

/// Colors of one ledger row: `base` covers the whole row, `highlight`
/// (when present) goes over the status-bearing columns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RowPaint {
    pub base: Color,
    pub highlight: Option<Color>,
}

impl RowPaint {
    pub fn of(amount: f64, status: &str) -> RowPaint {
        let base = if amount < 0f64 {
            Color::NEGATIVE
        } else {
            Color::WHITE
        };
        let highlight = match Status::classify(status) {
            Status::AwaitingConfirmation => Some(Color::AWAITING_CONFIRMATION),
            Status::PaidByCheck => Some(Color::PAID_BY_CHECK),
            Status::Balance => Some(Color::BALANCE),
            Status::CreditCardPending => Some(Color::CREDIT_CARD_PENDING),
            Status::Scheduled => Some(Color::SCHEDULED),
            Status::Paid if amount < 0f64 => Some(Color::PAID_OUTFLOW),
            Status::Paid if amount > 0f64 => Some(Color::PAID_INFLOW),
            Status::Paid | Status::Other => None,
        };
        RowPaint { base, highlight }
    }

    /// Color shown on the highlighted columns.
    pub fn color(&self) -> Color {
        self.highlight.unwrap_or(self.base)
    }
}

pub fn color_for(amount: f64, status: &str) -> Color {
    RowPaint::of(amount, status).color()
}

#[cfg(test)]
mod tests {
    use crate::paint::{color_for, Color, RowPaint, Status};

    #[test]
    fn test_base_colors() {
        assert_eq!(color_for(-10f64, "unrecognized"), Color::NEGATIVE);
        assert_eq!(color_for(10f64, "unrecognized"), Color::WHITE);
        assert_eq!(color_for(0f64, ""), Color::WHITE);
    }

    #[test]
    fn test_paid_depends_on_sign() {
        assert_eq!(color_for(-10f64, "Pago"), Color::PAID_OUTFLOW);
        assert_eq!(color_for(10f64, "Pago"), Color::PAID_INFLOW);
        assert_eq!(
            RowPaint::of(0f64, "Pago"),
            RowPaint {
                base: Color::WHITE,
                highlight: None,
            }
        );
    }

    #[test]
    fn test_marker_priority() {
        assert_eq!(color_for(-1f64, "À pagar - CONFIRMAR VALOR !!"), Color::AWAITING_CONFIRMATION);
        assert_eq!(color_for(-1f64, "Pago - CHEQUE !!"), Color::PAID_BY_CHECK);
        assert_eq!(color_for(5f64, "SALDO"), Color::BALANCE);
        assert_eq!(
            color_for(-1f64, "À pagar - CARTÃO DE CRÉDITO NUBANK"),
            Color::CREDIT_CARD_PENDING
        );
        // card marker outranks the scheduled marker
        assert_eq!(
            Status::classify("Agendado / À pagar - CARTÃO DE CRÉDITO"),
            Status::CreditCardPending
        );
        assert_eq!(color_for(-1f64, "Agendado dia 10"), Color::SCHEDULED);
        // exact markers only
        assert_eq!(Status::classify("pago"), Status::Other);
        assert_eq!(Status::classify("SALDO "), Status::Other);
    }

    #[test]
    fn test_negative_base_under_highlight() {
        let paint = RowPaint::of(-3f64, "Agendado");
        assert_eq!(paint.base, Color::NEGATIVE);
        assert_eq!(paint.highlight, Some(Color::SCHEDULED));
    }

    #[test]
    fn test_display_hex() {
        assert_eq!(format!("{}", Color::PAID_BY_CHECK), "#00ffff");
        assert_eq!(format!("{}", Color::rgb(0x1b7e1cd)), "#b7e1cd");
    }
}
