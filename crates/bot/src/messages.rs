//! Localized reply templates.
//!
//! Every reply the bot sends is built here. Templates take the API records
//! directly so handlers never format text themselves.

use std::fmt::Write as _;
use std::str::FromStr;

use slh_shop_core::OrderId;
use slh_shop_core::models::{Item, OrderWithPayment, ProofReceipt, ProofTarget, Shop};

/// Reply language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    He,
    En,
}

impl FromStr for Locale {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "he" | "he-il" => Ok(Self::He),
            "en" | "en-us" | "en-gb" => Ok(Self::En),
            _ => Err(()),
        }
    }
}

/// What went wrong, as far as the end user is told.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    /// `/start` could not register the user.
    Sync,
    /// `/myshop` could not load or create the shop.
    MyShop,
    /// `/demo_order` could not create the order.
    DemoOrder,
    /// No shop matches a deep-link referral code.
    ShopNotFound,
    /// There is no order to attach a photo to.
    NoOrder,
    /// The order no longer accepts a proof.
    ProofRejected,
    /// Upload failed for any other reason.
    Proof,
}

/// `https://t.me/<bot>?start=shop_<code>`
#[must_use]
pub fn deep_link(bot_username: &str, referral_code: &str) -> String {
    format!("https://t.me/{bot_username}?start=shop_{referral_code}")
}

#[must_use]
pub fn welcome(locale: Locale, name: &str) -> String {
    match locale {
        Locale::He => format!(
            "היי {name}! 👋\n\
             חיברתי אותך ל-SLH Shop Core.\n\n\
             פקודות זמינות:\n\
             /myshop  לראות/ליצור את החנות שלך\n\
             /demo_order  ליצור הזמנת ניסיון ולקבל הוראות תשלום\n\
             (אפשר גם להשתמש בלינקים עם /start shop_<referral_code> כדי להיכנס לחנות של מישהו אחר.)"
        ),
        Locale::En => format!(
            "Hi {name}! 👋\n\
             You are connected to SLH Shop Core.\n\n\
             Available commands:\n\
             /myshop  view or create your shop\n\
             /demo_order  create a test order and get payment instructions\n\
             (Links of the form /start shop_<referral_code> open someone else's shop.)"
        ),
    }
}

#[must_use]
pub fn my_shop(locale: Locale, shop: &Shop, deep_link: &str) -> String {
    let (heading, name, status) = match locale {
        Locale::He => ("🏪 החנות שלך:", "שם", "סטטוס"),
        Locale::En => ("🏪 Your shop:", "Name", "Status"),
    };
    let share = match locale {
        Locale::He => "שתף את הלינק כדי להזמין קונים:",
        Locale::En => "Share this link to invite buyers:",
    };

    format!(
        "{heading}\n\
         {name}: {title}\n\
         {status}: {shop_status}\n\
         shop_id: {id}\n\
         referral_code: {code}\n\n\
         {share}\n\
         {deep_link}",
        title = shop.title,
        shop_status = shop.status,
        id = shop.id,
        code = shop.referral_code,
    )
}

#[must_use]
pub fn demo_order(locale: Locale, item: &Item, created: &OrderWithPayment) -> String {
    let pay = &created.payment_instructions;
    match locale {
        Locale::He => format!(
            "✅ יצרתי עבורך הזמנת ניסיון.\n\n\
             🎴 פריט: {item}\n\
             💰 סכום: {amount} {symbol}\n\
             🧾 הזמנה: {order}\n\n\
             שלם לכתובת:\n\
             {address}\n\
             Chain ID: {chain}\n\n\
             אחרי התשלום שלח לכאן צילום מסך של האישור.",
            item = item.name,
            amount = pay.amount,
            symbol = pay.symbol,
            order = created.order.id,
            address = pay.to_address,
            chain = pay.chain_id,
        ),
        Locale::En => format!(
            "✅ Created a test order for you.\n\n\
             🎴 Item: {item}\n\
             💰 Amount: {amount} {symbol}\n\
             🧾 Order: {order}\n\n\
             Pay to:\n\
             {address}\n\
             Chain ID: {chain}\n\n\
             After paying, send a screenshot of the confirmation here.",
            item = item.name,
            amount = pay.amount,
            symbol = pay.symbol,
            order = created.order.id,
            address = pay.to_address,
            chain = pay.chain_id,
        ),
    }
}

#[must_use]
pub fn shop_view(locale: Locale, shop: &Shop, items: &[Item]) -> String {
    let (welcome, name, status, listing, empty) = match locale {
        Locale::He => (
            "ברוך הבא לחנות 🏪",
            "שם החנות",
            "סטטוס",
            "פריטים בחנות:",
            "(אין פריטים בחנות עדיין)",
        ),
        Locale::En => (
            "Welcome to the shop 🏪",
            "Shop name",
            "Status",
            "Items:",
            "(no items yet)",
        ),
    };

    let mut text = format!(
        "{welcome}\n{name}: {}\n{status}: {}\nshop_id: {}\nreferral_code: {}\n\n{listing}",
        shop.title, shop.status, shop.id, shop.referral_code
    );

    if items.is_empty() {
        let _ = write!(text, "\n{empty}");
    }
    for (idx, item) in items.iter().enumerate() {
        let price = item
            .price_slh
            .map(|p| format!("{p} SLH"))
            .unwrap_or_default();
        let _ = write!(text, "\n{}. {}  {price}", idx + 1, item.name);
    }

    text
}

#[must_use]
pub fn proof_received(locale: Locale, receipt: &ProofReceipt) -> String {
    let order = receipt.order_id;
    let how = match (locale, receipt.resolved_by) {
        (Locale::He, ProofTarget::Explicit) => "ההזמנה האחרונה שיצרת בשיחה הזו",
        (Locale::He, ProofTarget::LatestForBuyer) => "ההזמנה האחרונה שלך במערכת",
        (Locale::En, ProofTarget::Explicit) => "the order you created in this chat",
        (Locale::En, ProofTarget::LatestForBuyer) => "your most recent order",
    };
    match locale {
        Locale::He => format!(
            "📷 תודה! קיבלתי את צילום האישור.\n\
             צירפתי אותו להזמנה {order} ({how}).\n\
             ההזמנה ממתינה כעת לאימות."
        ),
        Locale::En => format!(
            "📷 Thanks! Payment proof received.\n\
             Attached to order {order} ({how}).\n\
             The order is now waiting for verification."
        ),
    }
}

/// Reply to a proof that the API rejected because the order is closed.
#[must_use]
pub fn proof_rejected(locale: Locale, order_id: Option<OrderId>) -> String {
    let base = failure(locale, Failure::ProofRejected);
    match order_id {
        Some(id) => format!("{base} ({id})"),
        None => base,
    }
}

#[must_use]
pub fn failure(locale: Locale, failure: Failure) -> String {
    let text = match (locale, failure) {
        (Locale::He, Failure::Sync) => "❌ שגיאה בסנכרון משתמש עם ה-API.",
        (Locale::He, Failure::MyShop) => "❌ שגיאה בטעינת/יצירת החנות שלך.",
        (Locale::He, Failure::DemoOrder) => "❌ שגיאה ביצירת הזמנת ניסיון.",
        (Locale::He, Failure::ShopNotFound) => "❌ לא הצלחתי למצוא חנות לקוד הזה.",
        (Locale::He, Failure::NoOrder) => "❌ לא מצאתי הזמנה לצרף אליה את האישור. נסה /demo_order קודם.",
        (Locale::He, Failure::ProofRejected) => "❌ ההזמנה כבר לא מחכה לאישור תשלום.",
        (Locale::He, Failure::Proof) => "❌ שגיאה בשמירת צילום האישור.",
        (Locale::En, Failure::Sync) => "❌ Could not sync your user with the API.",
        (Locale::En, Failure::MyShop) => "❌ Could not load or create your shop.",
        (Locale::En, Failure::DemoOrder) => "❌ Could not create a test order.",
        (Locale::En, Failure::ShopNotFound) => "❌ No shop matches this code.",
        (Locale::En, Failure::NoOrder) => {
            "❌ No order found to attach the proof to. Try /demo_order first."
        }
        (Locale::En, Failure::ProofRejected) => "❌ This order no longer accepts a payment proof.",
        (Locale::En, Failure::Proof) => "❌ Could not save the payment proof.",
    };
    text.to_string()
}

#[must_use]
pub fn unknown_command(locale: Locale) -> String {
    match locale {
        Locale::He => "לא הכרתי את הפקודה. נסה /start, /myshop או /demo_order.".to_string(),
        Locale::En => "Unknown command. Try /start, /myshop or /demo_order.".to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;
    use slh_shop_core::models::Order;
    use slh_shop_core::{
        ItemId, OrderStatus, PaymentInstructions, ShopId, ShopStatus, ShopType, UserId,
    };

    use super::*;

    fn shop() -> Shop {
        Shop {
            id: ShopId::generate(),
            owner_user_id: UserId::generate(),
            title: "Sela Shop".to_string(),
            description: None,
            slug: "sela-shop-abc123".to_string(),
            shop_type: ShopType::Basic,
            status: ShopStatus::Active,
            referral_code: "Ab12Cd34".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn item(shop_id: ShopId, name: &str, price_slh: Option<Decimal>) -> Item {
        Item {
            id: ItemId::generate(),
            shop_id,
            name: name.to_string(),
            description: None,
            image_url: None,
            price_slh,
            price_bnb: None,
            price_nis: None,
            metadata: serde_json::json!({}),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_locale_parsing() {
        assert_eq!("he".parse::<Locale>(), Ok(Locale::He));
        assert_eq!(" EN ".parse::<Locale>(), Ok(Locale::En));
        assert!("fr".parse::<Locale>().is_err());
        assert_eq!(Locale::default(), Locale::He);
    }

    #[test]
    fn test_deep_link() {
        assert_eq!(
            deep_link("SlhShopBot", "Ab12Cd34"),
            "https://t.me/SlhShopBot?start=shop_Ab12Cd34"
        );
    }

    #[test]
    fn test_my_shop_contains_link_and_code() {
        let shop = shop();
        let link = deep_link("SlhShopBot", &shop.referral_code);
        let text = my_shop(Locale::En, &shop, &link);
        assert!(text.contains("Sela Shop"));
        assert!(text.contains("active"));
        assert!(text.contains(&shop.id.to_string()));
        assert!(text.ends_with(&link));
    }

    #[test]
    fn test_shop_view_lists_items_in_order() {
        let shop = shop();
        let items = vec![
            item(shop.id, "Love Card 39 NIS", Some("39.0".parse().unwrap())),
            item(shop.id, "BNB only", None),
        ];
        let text = shop_view(Locale::En, &shop, &items);
        assert!(text.contains("1. Love Card 39 NIS  39.0 SLH"));
        assert!(text.contains("2. BNB only"));
        assert!(!text.contains("no items yet"));

        let empty = shop_view(Locale::He, &shop, &[]);
        assert!(empty.contains("(אין פריטים בחנות עדיין)"));
    }

    #[test]
    fn test_demo_order_shows_payment_instructions() {
        let shop = shop();
        let item = item(shop.id, "Love Card 39 NIS", Some("39.0".parse().unwrap()));
        let created = OrderWithPayment {
            order: Order {
                id: OrderId::generate(),
                buyer_user_id: shop.owner_user_id,
                shop_id: shop.id,
                item_id: item.id,
                amount_slh: item.price_slh,
                amount_bnb: None,
                status: OrderStatus::Pending,
                tx_hash: None,
                payment_proof_url: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            payment_instructions: PaymentInstructions {
                to_address: "0xACb0A09414CEA1C879c67bB7A877E4e19480f022".to_string(),
                amount: "39.0".parse().unwrap(),
                symbol: "SLH".to_string(),
                chain_id: 56,
            },
        };

        let text = demo_order(Locale::He, &item, &created);
        assert!(text.contains("39.0 SLH"));
        assert!(text.contains("0xACb0A09414CEA1C879c67bB7A877E4e19480f022"));
        assert!(text.contains("Chain ID: 56"));
        assert!(text.contains(&created.order.id.to_string()));
    }

    #[test]
    fn test_proof_received_names_order() {
        let receipt = ProofReceipt {
            order_id: OrderId::generate(),
            resolved_by: ProofTarget::LatestForBuyer,
            status: OrderStatus::WaitingVerification,
            payment_proof_url: "/uploaded_proofs/x.jpg".to_string(),
        };
        let text = proof_received(Locale::En, &receipt);
        assert!(text.contains(&receipt.order_id.to_string()));
        assert!(text.contains("your most recent order"));
    }

    #[test]
    fn test_every_failure_is_localized() {
        for failure_kind in [
            Failure::Sync,
            Failure::MyShop,
            Failure::DemoOrder,
            Failure::ShopNotFound,
            Failure::NoOrder,
            Failure::ProofRejected,
            Failure::Proof,
        ] {
            let he = failure(Locale::He, failure_kind);
            let en = failure(Locale::En, failure_kind);
            assert!(he.starts_with('❌'));
            assert_ne!(he, en);
        }
    }
}
