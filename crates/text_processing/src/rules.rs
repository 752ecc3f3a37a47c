//! Ordered pattern rules for intent and sentiment
//!
//! Patterns run against the lowercased utterance and the first matching rule
//! wins. Latin-script alternatives are word-bounded; CJK alternatives are not,
//! since those scripts have no word boundaries.

use once_cell::sync::Lazy;
use regex::Regex;

use storefront_chat_core::{Intent, Sentiment};

struct IntentRule {
    intent: Intent,
    pattern: Regex,
}

fn rule(intent: Intent, pattern: &str) -> IntentRule {
    IntentRule {
        intent,
        pattern: Regex::new(pattern).expect("static regex"),
    }
}

static INTENT_RULES: Lazy<Vec<IntentRule>> = Lazy::new(|| {
    vec![
        // Whole-message greetings only, so "hi, any red dresses?" is a search
        rule(
            Intent::Greeting,
            r"^\s*(?:hi|hello|hey|hiya|good (?:morning|afternoon|evening)|bonjour|salut|hola|buenos d[ií]as|hallo|guten tag|servus|ciao|buongiorno|ol[aá]|oi|bom dia|こんにちは|こんばんは|おはよう|你好|您好|嗨)(?:\s+there)?[\s!.,?~！。]*$",
        ),
        rule(
            Intent::Thanks,
            r"^\s*(?:ok(?:ay)?\s*,?\s*)?(?:thanks|thank you|thx|ty|cheers|merci(?: beaucoup)?|gracias|muchas gracias|danke(?: schön| sehr)?|grazie(?: mille)?|obrigad[oa]|ありがとう(?:ございます)?|谢谢|多谢)(?:\s+(?:so much|a lot|again|very much))?[\s!.,~！。]*$",
        ),
        rule(
            Intent::Returns,
            r"\b(?:return(?:s|ed|ing)?|refund\w*|exchang\w*|send (?:it|them) back|retour\w*|rembours\w*|[ée]change\w*|devoluci[oó]n\w*|devolver|reembols\w*|r[üu]ckgabe|r[üu]cksend\w*|erstatt\w*|umtausch\w*|reso|resi|rimbors\w*|devolu[çc][ãa]o)\b|返品|返金|交換|退货|退款|退换",
        ),
        rule(
            Intent::Shipping,
            r"\b(?:ship\w*|deliver\w*|tracking|track (?:my|an|the) (?:order|package|parcel)|courier|livraison|livr\w*|exp[ée]di\w*|env[ií]o\w*|entrega\w*|versand\w*|liefer\w*|spedizion\w*|spedi\w*|consegn\w*|frete)\b|配送|発送|送料|届く|运费|发货|快递|物流|送货",
        ),
        rule(
            Intent::SizeFit,
            r"\b(?:size\w*|sizing|fit|fits|fitting|measurements?|too (?:small|big|tight|loose)|taille\w*|talla\w*|gr[öo](?:ß|ss)e\w*|passform|taglia\w*|vestibilit[àa]|tamanho\w*)\b|サイズ|寸法|尺码|尺寸|大小",
        ),
        rule(
            Intent::Comparison,
            r"\b(?:compar\w*|versus|vs|difference between|better than|which (?:one )?is better|diff[ée]rence entre|diferencia entre|unterschied\w*|vergleich\w*|confront\w*|differenza|diferen[çc]a)\b|比較|違い|比较|区别|哪个好",
        ),
        rule(
            Intent::Availability,
            r"\b(?:in stock|out of stock|available|availability|sold out|back in stock|restock\w*|en stock|disponib\w*|rupture|agotad\w*|verf[üu]gbar\w*|lieferbar|ausverkauft|esaurit\w*|dispon[ií]ve\w*|esgotad\w*)\b|在庫|入荷|有货|库存|现货",
        ),
        rule(
            Intent::PriceInquiry,
            r"\b(?:price\w*|pricing|cost\w*|how much|cheap\w*|expensive|discount\w*|on sale|coupon\w*|promo\w*|prix|co[uû]te?\w*|combien|precio\w*|cuesta|cu[aá]nto|preis\w*|kostet|wie viel|prezz\w*|quanto cost\w*|pre[çc]o\w*|quanto custa)\b|値段|価格|いくら|割引|价格|多少钱|便宜|打折",
        ),
        rule(
            Intent::Support,
            r"\b(?:help with my|customer (?:service|support|care)|support team|problem\w*|issue with|broken|damaged|defective|complain\w*|order status|my order|where is my|cancel\w*|contact (?:you|us|support)|(?:speak|talk) (?:to|with) (?:a |an )?(?:human|person|agent|someone|manager)|representative|service client|r[ée]clamation|servicio al cliente|reclamaci[oó]n|kundenservice|kundendienst|beschwerde|servizio clienti|reclamo|atendimento|reclama[çc][ãa]o)\b|問い合わせ|クレーム|注文状況|客服|投诉|人工",
        ),
        rule(
            Intent::ProductSearch,
            r"\b(?:show me|looking for|look for|search\w*|find|do you (?:have|sell|carry)|recommend\w*|suggest\w*|i want|i need|i'd like|buy|shop for|gift|je cherche|cherche|montrez|avez-vous|busco|buscando|mu[eé]strame|quiero|tienen|ich suche|suche|zeig\w*|habt ihr|cerco|mostrami|vorrei|avete|procuro|quero|mostre|voc[eê]s t[eê]m)\b|探して|欲しい|ありますか|おすすめ|找|推荐|想要|有没有",
        ),
    ]
});

static NEGATIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:not (?:good|happy|great|working|satisfied|ok(?:ay)?)|bad|terrible|awful|horrible|worst|hate|angry|upset|disappoint\w*|broken|damaged|useless|annoy\w*|frustrat\w*|ridiculous|scam|never again|unacceptable|mauvais\w*|d[ée]çu\w*|nul|malo|mala|p[ée]sim\w*|decepcionad\w*|schlecht\w*|entt[äa]usch\w*|schrecklich|cattiv\w*|delus\w*|terribile|ruim|horr[ií]vel)\b|最悪|ひどい|残念|不満|糟糕|失望|生气|太差",
    )
    .expect("static regex")
});

static POSITIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:love\w*|great|awesome|amazing|perfect|excellent|wonderful|fantastic|beautiful|happy|nice|good|cool|thanks|thank you|j'adore|g[ée]nial|parfait\w*|super|magnifique|me encanta|genial|perfect[oa]|encantad[oa]|toll|wunderbar|perfekt|sch[öo]n|ottim[oa]|perfett[oa]|bellissim\w*|adoro|[óo]tim[oa]|perfeit[oa]|lind[oa])\b|素晴らしい|最高|嬉しい|ありがとう|可爱|喜欢|完美|谢谢|太好了",
    )
    .expect("static regex")
});

/// First intent rule matching the utterance
pub fn match_intent(utterance: &str) -> Option<Intent> {
    let lowered = utterance.to_lowercase();
    INTENT_RULES
        .iter()
        .find(|rule| rule.pattern.is_match(&lowered))
        .map(|rule| rule.intent)
}

/// Sentiment by pattern; negative is checked first so "not good" is negative
pub fn match_sentiment(utterance: &str) -> Option<Sentiment> {
    let lowered = utterance.to_lowercase();
    if NEGATIVE.is_match(&lowered) {
        Some(Sentiment::Negative)
    } else if POSITIVE.is_match(&lowered) {
        Some(Sentiment::Positive)
    } else {
        None
    }
}
