//! Command parsing for incoming text messages.

/// Deep-link payload prefix that opens a shop.
pub const SHOP_PAYLOAD_PREFIX: &str = "shop_";

/// A bot command addressed to this bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/start`, optionally carrying `shop_<referral_code>`.
    Start { referral_code: Option<String> },
    /// `/myshop`
    MyShop,
    /// `/demo_order`
    DemoOrder,
    /// Any other command.
    Unknown(String),
}

impl Command {
    /// Parse a message text.
    ///
    /// Returns `None` for plain text and for commands addressed to a
    /// different bot (`/start@OtherBot`).
    #[must_use]
    pub fn parse(text: &str, bot_username: Option<&str>) -> Option<Self> {
        let text = text.trim();
        let rest = text.strip_prefix('/')?;
        let (head, args) = rest
            .split_once(char::is_whitespace)
            .map_or((rest, ""), |(head, args)| (head, args.trim()));

        let name = match head.split_once('@') {
            Some((name, target)) => {
                let ours = bot_username.is_some_and(|bot| bot.eq_ignore_ascii_case(target));
                if !ours {
                    return None;
                }
                name
            }
            None => head,
        };

        let command = match name.to_ascii_lowercase().as_str() {
            "start" => Self::Start {
                referral_code: referral_code(args),
            },
            "myshop" => Self::MyShop,
            "demo_order" => Self::DemoOrder,
            "" => return None,
            other => Self::Unknown(other.to_string()),
        };
        Some(command)
    }
}

/// Extract the referral code from a `/start` payload.
fn referral_code(args: &str) -> Option<String> {
    let payload = args.split_whitespace().next()?;
    let code = payload.strip_prefix(SHOP_PAYLOAD_PREFIX)?;
    let valid = !code.is_empty() && code.chars().all(|c| c.is_ascii_alphanumeric());
    valid.then(|| code.to_string())
}
