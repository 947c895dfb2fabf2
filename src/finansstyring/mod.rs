// Finansstyring - bookkeeping
//
// Each regnskab (account book) holds:
// - konti: balance accounts with a monthly credit line
// - budgetkonti: income/expense lines with a monthly budget
// - bogføringslinjer: postings against a konto and optionally a budgetkonto
//   and an address

pub mod money;
pub mod konto;
pub mod bogforing;
pub mod regnskab;

pub use money::Money;
pub use konto::{
    Budgetkonto, Budgetkontogruppe, Budgetoplysninger, Konto, Kontogruppe, KontogruppeType,
    Kreditoplysninger,
};
pub use bogforing::{Bogforingsadvarsel, Bogforingslinje, Bogforingsresultat, Postering};
pub use regnskab::{Adressekontostatus, Budgetkontostatus, Kontostatus, Regnskab};
